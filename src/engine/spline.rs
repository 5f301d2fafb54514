//! Natural cubic spline interpolation for easing curves
//!
//! Every animated channel (scale, vertical offset, glow, opacity) maps its
//! lifecycle progress through one of these curves. A spline is built once
//! from a handful of control points and then shared by every entity of the
//! same kind, so evaluation must be cheap and the curve immutable.
//!
//! ## Algorithm
//!
//! Slopes `k[i]` at the knots are obtained from the natural-boundary
//! tridiagonal system (second derivative zero at both ends):
//!
//! ```text
//! row 0:     (2/h0)·k0 + (1/h0)·k1                      = 3·Δy0/h0²
//! row i:     (1/h(i-1))·k(i-1)
//!          + 2·(1/h(i-1) + 1/hi)·ki + (1/hi)·k(i+1)     = 3·(Δy(i-1)/h(i-1)² + Δyi/hi²)
//! row n-1:   (1/h)·k(n-2) + (2/h)·k(n-1)                = 3·Δy/h²
//! ```
//!
//! Evaluation uses the Hermite form on the containing segment. Queries
//! outside the knot range continue through the boundary segment, which gives
//! smooth natural extrapolation instead of a hard clamp.

/// A single `(time, value)` knot of an easing curve.
///
/// By convention curves span `time ∈ [0, 1]` with strictly increasing times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub time: f64,
    pub value: f64,
}

impl ControlPoint {
    pub const fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Immutable natural cubic spline over a set of control points.
#[derive(Debug, Clone)]
pub struct Spline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Slope at each knot, solved once at construction.
    ks: Vec<f64>,
}

impl Spline {
    /// Build a spline from ordered control points.
    ///
    /// Panics if fewer than two points are given or times are not strictly
    /// increasing; curves are compiled-in constants, so a bad table is a
    /// programming error.
    pub fn new(points: &[ControlPoint]) -> Self {
        assert!(points.len() >= 2, "spline needs at least two control points");
        for pair in points.windows(2) {
            assert!(
                pair[0].time < pair[1].time,
                "spline control point times must be strictly increasing"
            );
        }

        let xs: Vec<f64> = points.iter().map(|p| p.time).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.value).collect();
        let ks = natural_slopes(&xs, &ys);
        Self { xs, ys, ks }
    }

    /// Evaluate the curve at `t`.
    ///
    /// Values outside the knot range extrapolate through the nearest
    /// boundary segment.
    pub fn at(&self, t: f64) -> f64 {
        let n = self.xs.len();

        // Containing segment, clamped so out-of-range queries reuse the
        // boundary segment.
        let mut i = 1;
        while i < n - 1 && self.xs[i] < t {
            i += 1;
        }

        let x0 = self.xs[i - 1];
        let x1 = self.xs[i];
        let y0 = self.ys[i - 1];
        let y1 = self.ys[i];
        let h = x1 - x0;

        let s = (t - x0) / h;
        let a = self.ks[i - 1] * h - (y1 - y0);
        let b = -self.ks[i] * h + (y1 - y0);

        (1.0 - s) * y0 + s * y1 + s * (1.0 - s) * (a * (1.0 - s) + b * s)
    }
}

/// Solve the natural-boundary tridiagonal system for knot slopes
/// (Thomas algorithm).
fn natural_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let mut sub = vec![0.0; n];
    let mut diag = vec![0.0; n];
    let mut sup = vec![0.0; n];
    let mut rhs = vec![0.0; n];

    let h0 = xs[1] - xs[0];
    diag[0] = 2.0 / h0;
    sup[0] = 1.0 / h0;
    rhs[0] = 3.0 * (ys[1] - ys[0]) / (h0 * h0);

    for i in 1..n - 1 {
        let hl = xs[i] - xs[i - 1];
        let hr = xs[i + 1] - xs[i];
        sub[i] = 1.0 / hl;
        diag[i] = 2.0 * (1.0 / hl + 1.0 / hr);
        sup[i] = 1.0 / hr;
        rhs[i] = 3.0 * ((ys[i] - ys[i - 1]) / (hl * hl) + (ys[i + 1] - ys[i]) / (hr * hr));
    }

    let hn = xs[n - 1] - xs[n - 2];
    sub[n - 1] = 1.0 / hn;
    diag[n - 1] = 2.0 / hn;
    rhs[n - 1] = 3.0 * (ys[n - 1] - ys[n - 2]) / (hn * hn);

    // Forward sweep
    for i in 1..n {
        let m = sub[i] / diag[i - 1];
        diag[i] -= m * sup[i - 1];
        rhs[i] -= m * rhs[i - 1];
    }

    // Back substitution
    let mut ks = vec![0.0; n];
    ks[n - 1] = rhs[n - 1] / diag[n - 1];
    for i in (0..n - 1).rev() {
        ks[i] = (rhs[i] - sup[i] * ks[i + 1]) / diag[i];
    }
    ks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glow_curve() -> Spline {
        Spline::new(&[
            ControlPoint::new(0.0, 0.0),
            ControlPoint::new(0.15, 1.0),
            ControlPoint::new(0.6, 1.0),
            ControlPoint::new(1.0, 0.0),
        ])
    }

    #[test]
    fn hits_every_control_point() {
        let spline = glow_curve();
        assert!((spline.at(0.0) - 0.0).abs() < 1e-9);
        assert!((spline.at(0.15) - 1.0).abs() < 1e-9);
        assert!((spline.at(0.6) - 1.0).abs() < 1e-9);
        assert!((spline.at(1.0) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn interpolates_between_knots() {
        let spline = Spline::new(&[
            ControlPoint::new(0.0, 0.0),
            ControlPoint::new(1.0, 1.0),
        ]);
        // Two points degenerate to a straight line.
        assert!((spline.at(0.25) - 0.25).abs() < 1e-9);
        assert!((spline.at(0.5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn rise_is_monotonic_on_linear_table() {
        let spline = Spline::new(&[
            ControlPoint::new(0.0, 0.95),
            ControlPoint::new(0.7, 1.025),
            ControlPoint::new(1.0, 1.0),
        ]);
        // Word scale ramps up through the early part of the first segment.
        let mut prev = spline.at(0.0);
        for step in 1..=20 {
            let v = spline.at(0.6 * step as f64 / 20.0);
            assert!(v >= prev - 1e-9, "scale curve dipped before its peak");
            prev = v;
        }
    }

    #[test]
    fn extrapolates_through_boundary_segments() {
        let spline = Spline::new(&[
            ControlPoint::new(0.0, 0.0),
            ControlPoint::new(1.0, 1.0),
        ]);
        // Linear segment keeps its slope outside the range.
        assert!((spline.at(-0.5) - -0.5).abs() < 1e-9);
        assert!((spline.at(1.5) - 1.5).abs() < 1e-9);
    }

    #[test]
    #[should_panic]
    fn rejects_single_point() {
        let _ = Spline::new(&[ControlPoint::new(0.0, 1.0)]);
    }

    #[test]
    #[should_panic]
    fn rejects_unordered_times() {
        let _ = Spline::new(&[
            ControlPoint::new(0.5, 0.0),
            ControlPoint::new(0.2, 1.0),
        ]);
    }
}
