//! Viewport-range culling
//!
//! On arbitrarily long documents only a small index window of lines is
//! eligible for expensive spring and glow work; everything else still gets
//! its cheap lifecycle class update. Two independent tracker variants cover
//! the two contexts the engine runs in:
//!
//! - [`ViewportTracker`] derives the window from scroll geometry the host
//!   keeps on the line elements (stored offsets only, never a reflowing
//!   query), refreshed at a throttled cadence;
//! - [`ActiveWindowTracker`] centers the window on the currently active
//!   line index, for compact contexts where scroll position is unreliable.

use serde::{Deserialize, Serialize};

/// Scroll container geometry as measured by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollMetrics {
    pub scroll_top: f32,
    pub client_height: f32,
}

/// Scroll-geometry-derived index window over the flat line array.
#[derive(Debug)]
pub struct ViewportTracker {
    /// Inclusive index bounds; `None` means treat every line as visible.
    range: Option<(usize, usize)>,
    buffer: usize,
    refresh_interval: u32,
    frames_until_refresh: u32,
}

impl ViewportTracker {
    pub fn new(refresh_interval: u32, buffer: usize) -> Self {
        Self {
            range: None,
            buffer,
            refresh_interval,
            frames_until_refresh: 0,
        }
    }

    /// Recompute the window from the current scroll band and per-line boxes.
    ///
    /// Throttled to once every `refresh_interval` calls unless `force` is
    /// set (song change, resize). A `None` box marks a line whose element is
    /// missing; it never intersects. When no line intersects the band at all
    /// (mid-transition), every line is treated as visible rather than
    /// silently skipping animation.
    pub fn update<I>(&mut self, metrics: Option<ScrollMetrics>, boxes: I, force: bool)
    where
        I: IntoIterator<Item = Option<(f32, f32)>>,
    {
        if !force && self.frames_until_refresh > 0 {
            self.frames_until_refresh -= 1;
            return;
        }
        self.frames_until_refresh = self.refresh_interval.saturating_sub(1);

        let Some(metrics) = metrics else {
            self.range = None;
            return;
        };

        let band_top = metrics.scroll_top;
        let band_bottom = metrics.scroll_top + metrics.client_height;

        let mut first: Option<usize> = None;
        let mut last: Option<usize> = None;
        let mut count = 0usize;
        for (index, item) in boxes.into_iter().enumerate() {
            count = index + 1;
            let Some((top, height)) = item else { continue };
            let bottom = top + height;
            if top < band_bottom && bottom > band_top {
                first.get_or_insert(index);
                last = Some(index);
            }
        }

        self.range = match (first, last) {
            (Some(first), Some(last)) => Some((
                first.saturating_sub(self.buffer),
                (last + self.buffer).min(count.saturating_sub(1)),
            )),
            _ => None,
        };
    }

    /// O(1) gate every per-line animator call must pass.
    pub fn contains(&self, index: usize) -> bool {
        match self.range {
            Some((start, end)) => index >= start && index <= end,
            None => true,
        }
    }

    pub fn range(&self) -> Option<(usize, usize)> {
        self.range
    }

    pub fn reset(&mut self) {
        self.range = None;
        self.frames_until_refresh = 0;
    }
}

/// Index window centered on the most recently observed active line.
///
/// Until an active line has been seen, every line is in range so the first
/// scan can find one.
#[derive(Debug)]
pub struct ActiveWindowTracker {
    active: Option<usize>,
    buffer: usize,
}

impl ActiveWindowTracker {
    pub fn new(buffer: usize) -> Self {
        Self {
            active: None,
            buffer,
        }
    }

    /// Record the active line found during the current walk.
    pub fn note_active(&mut self, index: usize) {
        self.active = Some(index);
    }

    pub fn contains(&self, index: usize) -> bool {
        match self.active {
            Some(active) => {
                index >= active.saturating_sub(self.buffer) && index <= active + self.buffer
            }
            None => true,
        }
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn reset(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 500 lines, 10px tall each, stacked from the top.
    fn boxes(n: usize) -> Vec<Option<(f32, f32)>> {
        (0..n).map(|i| Some((i as f32 * 10.0, 10.0))).collect()
    }

    #[test]
    fn culling_window_with_buffer() {
        let mut tracker = ViewportTracker::new(5, 3);
        // Band covers lines 40..=60.
        let metrics = ScrollMetrics {
            scroll_top: 400.0,
            client_height: 205.0,
        };
        tracker.update(Some(metrics), boxes(500), true);

        assert_eq!(tracker.range(), Some((37, 63)));
        for index in 37..=63 {
            assert!(tracker.contains(index), "index {index} should be in range");
        }
        assert!(!tracker.contains(36));
        assert!(!tracker.contains(64));
    }

    #[test]
    fn buffer_clamps_at_document_edges() {
        let mut tracker = ViewportTracker::new(5, 3);
        let metrics = ScrollMetrics {
            scroll_top: 0.0,
            client_height: 25.0,
        };
        tracker.update(Some(metrics), boxes(4), true);
        assert_eq!(tracker.range(), Some((0, 3)));
    }

    #[test]
    fn no_intersection_falls_back_to_all_visible() {
        let mut tracker = ViewportTracker::new(5, 3);
        let metrics = ScrollMetrics {
            scroll_top: 99_999.0,
            client_height: 100.0,
        };
        tracker.update(Some(metrics), boxes(10), true);
        assert_eq!(tracker.range(), None);
        assert!(tracker.contains(0));
        assert!(tracker.contains(9));
    }

    #[test]
    fn missing_metrics_treats_everything_visible() {
        let mut tracker = ViewportTracker::new(5, 3);
        tracker.update(None, boxes(10), true);
        assert!(tracker.contains(7));
    }

    #[test]
    fn refresh_is_throttled_but_forceable() {
        let mut tracker = ViewportTracker::new(5, 0);
        let near = ScrollMetrics {
            scroll_top: 0.0,
            client_height: 15.0,
        };
        let far = ScrollMetrics {
            scroll_top: 400.0,
            client_height: 15.0,
        };

        tracker.update(Some(near), boxes(100), false);
        assert_eq!(tracker.range(), Some((0, 1)));

        // Next four frames reuse the stale window even though scroll moved.
        for _ in 0..4 {
            tracker.update(Some(far), boxes(100), false);
            assert_eq!(tracker.range(), Some((0, 1)));
        }
        // Fifth frame refreshes.
        tracker.update(Some(far), boxes(100), false);
        assert_eq!(tracker.range(), Some((40, 41)));

        // Force overrides the cadence immediately.
        tracker.update(Some(near), boxes(100), true);
        assert_eq!(tracker.range(), Some((0, 1)));
    }

    #[test]
    fn active_window_defaults_to_everything() {
        let tracker = ActiveWindowTracker::new(5);
        assert!(tracker.contains(0));
        assert!(tracker.contains(499));
    }

    #[test]
    fn active_window_centers_on_noted_line() {
        let mut tracker = ActiveWindowTracker::new(5);
        tracker.note_active(20);
        assert!(tracker.contains(15));
        assert!(tracker.contains(25));
        assert!(!tracker.contains(14));
        assert!(!tracker.contains(26));

        tracker.reset();
        assert!(tracker.contains(0));
    }
}
