//! Damped harmonic oscillator for per-channel motion
//!
//! Each spring animates a single scalar channel. Multi-attribute motion
//! (scale + glow + offset) is modeled as independent springs sharing goal
//! logic, never a vector spring, so every attribute keeps its own frequency
//! and damping tuned to its perceptual role.
//!
//! The exact analytic solution is advanced every step instead of numerically
//! integrated, so frame-time jitter never accumulates error.
//!
//! ## Closed forms (`x` = offset from goal, `ω = 2π·frequency`, `d` = damping ratio)
//!
//! | Regime | Condition | Position |
//! |--------|-----------|----------|
//! | Underdamped | `d < 1` | `e^(-dωt)·(x₀·cos(ω_d t) + B·sin(ω_d t))`, `ω_d = ω·√(1-d²)` |
//! | Critical | `d = 1` | `e^(-ωt)·(x₀ + (v₀ + ω x₀)·t)` |
//! | Overdamped | `d > 1` | `A·e^(r₁t) + B·e^(r₂t)`, `r₁,₂ = ω·(-d ± √(d²-1))` |
//!
//! Near-critical underdamped springs collapse `ω_d → 0`; those are folded
//! into the critical branch, which is the stable limit of the trig terms.

pub type Num = f64;

const TAU: Num = std::f64::consts::TAU;

/// Velocity² below which the spring counts as motionless.
const SLEEP_VELOCITY_SQ: Num = 1e-4;
/// Offset-from-goal² below which the spring counts as settled
/// (half a pixel on a 4K-wide axis).
const SLEEP_OFFSET_SQ: Num = (1.0 / 3840.0) * (1.0 / 3840.0);

/// Damping ratios this close to 1 use the critically-damped branch.
const CRITICAL_BAND: Num = 1e-8;

/// Single-channel spring simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    position: Num,
    velocity: Num,
    goal: Num,
    frequency: Num,
    damping: Num,
}

impl Spring {
    /// Create a spring resting at `start` with goal = `start`.
    ///
    /// `frequency` is in hertz; `damping` is the damping ratio (1 =
    /// critically damped). Panics if `frequency * damping < 0`: such a
    /// spring gains energy forever, which is a configuration error, not a
    /// runtime condition.
    pub fn new(start: Num, frequency: Num, damping: Num) -> Self {
        assert!(
            frequency * damping >= 0.0,
            "spring would diverge: frequency ({frequency}) * damping ({damping}) < 0"
        );
        Self {
            position: start,
            velocity: 0.0,
            goal: start,
            frequency,
            damping,
        }
    }

    /// Change the target the spring settles toward.
    pub fn set_target(&mut self, goal: Num) {
        self.goal = goal;
    }

    /// Warp straight to `goal` with zero velocity.
    ///
    /// Used at store creation so an entity's first frame renders at rest
    /// instead of flying in from a default value.
    pub fn set_position(&mut self, goal: Num) {
        self.goal = goal;
        self.position = goal;
        self.velocity = 0.0;
    }

    /// Set the goal, optionally warping the position onto it
    /// (`replace_position` mirrors first-frame initialization).
    pub fn set_goal(&mut self, goal: Num, replace_position: bool) {
        if replace_position {
            self.set_position(goal);
        } else {
            self.set_target(goal);
        }
    }

    /// Advance the analytic solution by `dt` seconds and return the new
    /// position. `step(0.0)` returns the position bit-for-bit unchanged.
    pub fn step(&mut self, dt: Num) -> Num {
        if dt <= 0.0 {
            return self.position;
        }

        let offset = self.position - self.goal;
        let w0 = TAU * self.frequency;
        if w0 == 0.0 {
            // No restoring force; the channel drifts with its velocity.
            self.position += self.velocity * dt;
            return self.position;
        }

        let d = self.damping;
        let (x, v) = if (d - 1.0).abs() <= CRITICAL_BAND {
            let e = (-w0 * dt).exp();
            let c1 = self.velocity + w0 * offset;
            (
                e * (offset + c1 * dt),
                e * (self.velocity - w0 * c1 * dt),
            )
        } else if d < 1.0 {
            let wd = w0 * (1.0 - d * d).sqrt();
            let e = (-d * w0 * dt).exp();
            let cos = (wd * dt).cos();
            let sin = (wd * dt).sin();
            let b = (self.velocity + d * w0 * offset) / wd;
            (
                e * (offset * cos + b * sin),
                e * (self.velocity * cos
                    - (w0 * w0 * offset + d * w0 * self.velocity) / wd * sin),
            )
        } else {
            let zb = w0 * (d * d - 1.0).sqrt();
            let r1 = -d * w0 + zb;
            let r2 = -d * w0 - zb;
            let a = (self.velocity - r2 * offset) / (r1 - r2);
            let b = offset - a;
            let e1 = (r1 * dt).exp();
            let e2 = (r2 * dt).exp();
            (a * e1 + b * e2, a * r1 * e1 + b * r2 * e2)
        };

        self.position = self.goal + x;
        self.velocity = v;
        self.position
    }

    /// True once both velocity and offset from goal are imperceptible.
    ///
    /// Consumers driving their own scheduling stop requesting frames when
    /// this returns true.
    pub fn can_sleep(&self) -> bool {
        let offset = self.position - self.goal;
        self.velocity * self.velocity <= SLEEP_VELOCITY_SQ
            && offset * offset <= SLEEP_OFFSET_SQ
    }

    pub fn position(&self) -> Num {
        self.position
    }

    pub fn velocity(&self) -> Num {
        self.velocity
    }

    pub fn target(&self) -> Num {
        self.goal
    }
}
