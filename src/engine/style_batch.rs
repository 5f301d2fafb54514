//! Batched, change-detected style writes
//!
//! All spring-driven attribute writes for a tick are queued and committed
//! together by a single end-of-frame flush, so visual mutations never
//! interleave with computation. The queue is last-write-wins per
//! element/property: two animators touching the same property in one tick
//! can never flicker.
//!
//! On top of the queue sits a persistent last-committed-value cache with a
//! numeric epsilon: when both old and new values parse as numbers and differ
//! by no more than the epsilon, the write is dropped before it ever reaches
//! the queue. On long documents this bounds write volume to the entities
//! whose effective value moved perceptibly.

use std::collections::HashMap;

use crate::element::{ElementId, Elements};

type Key = (ElementId, &'static str);

/// Per-frame write queue plus persistent change-detection cache.
#[derive(Debug, Default)]
pub struct StyleBatch {
    queue: HashMap<Key, String>,
    cache: HashMap<Key, String>,
}

impl StyleBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a write unconditionally (last write this frame wins).
    pub fn queue_style(&mut self, el: ElementId, prop: &'static str, value: String) {
        self.queue.insert((el, prop), value);
    }

    /// Queue a write only if it differs from the last committed value by
    /// more than `epsilon`. Non-numeric values fall back to exact equality.
    pub fn set_style_if_changed(
        &mut self,
        el: ElementId,
        prop: &'static str,
        value: String,
        epsilon: f64,
    ) {
        if let Some(prev) = self.cache.get(&(el, prop)) {
            match (parse_leading_number(prev), parse_leading_number(&value)) {
                (Some(a), Some(b)) => {
                    if (a - b).abs() <= epsilon {
                        return;
                    }
                }
                _ => {
                    if *prev == value {
                        return;
                    }
                }
            }
        }
        self.cache.insert((el, prop), value.clone());
        self.queue_style(el, prop, value);
    }

    /// Commit every queued property and clear the queue. Called exactly
    /// once at the end of each frame tick.
    pub fn flush(&mut self, elements: &mut Elements) {
        for ((el, prop), value) in self.queue.drain() {
            elements.set_style(el, prop, value);
        }
    }

    /// Drop the queue and the persistent cache (song change / reset).
    pub fn clear(&mut self) {
        self.queue.clear();
        self.cache.clear();
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }
}

/// Parse the leading numeric portion of a style value
/// (`"12px"`, `"-45%"`, `"1.2"`).
fn parse_leading_number(value: &str) -> Option<f64> {
    let s = value.trim_start();
    let mut end = 0;
    for (i, c) in s.char_indices() {
        let numeric = c.is_ascii_digit() || c == '.' || ((c == '+' || c == '-') && i == 0);
        if !numeric {
            break;
        }
        end = i + c.len_utf8();
    }
    s[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_drops_imperceptible_change() {
        let mut elements = Elements::new();
        let el = elements.create();
        let mut batch = StyleBatch::new();

        batch.set_style_if_changed(el, "opacity", "0.500".into(), 0.01);
        batch.set_style_if_changed(el, "opacity", "0.505".into(), 0.01);
        batch.flush(&mut elements);

        assert_eq!(elements.committed_writes(), 1);
        assert_eq!(elements.style(el, "opacity"), Some("0.500"));
    }

    #[test]
    fn change_beyond_epsilon_goes_through() {
        let mut elements = Elements::new();
        let el = elements.create();
        let mut batch = StyleBatch::new();

        batch.set_style_if_changed(el, "--text-shadow-blur-radius", "4px".into(), 0.5);
        batch.set_style_if_changed(el, "--text-shadow-blur-radius", "6px".into(), 0.5);
        batch.flush(&mut elements);

        assert_eq!(elements.style(el, "--text-shadow-blur-radius"), Some("6px"));
    }

    #[test]
    fn last_write_wins_within_a_frame() {
        let mut elements = Elements::new();
        let el = elements.create();
        let mut batch = StyleBatch::new();

        batch.queue_style(el, "scale", "0.95".into());
        batch.queue_style(el, "scale", "1.02".into());
        assert_eq!(batch.queued_len(), 1);
        batch.flush(&mut elements);

        assert_eq!(elements.style(el, "scale"), Some("1.02"));
        assert_eq!(elements.committed_writes(), 1);
    }

    #[test]
    fn non_numeric_values_compare_exactly() {
        let mut elements = Elements::new();
        let el = elements.create();
        let mut batch = StyleBatch::new();

        let transform = "translate3d(0, calc(var(--lyrics-size) * 0.01), 0)";
        batch.set_style_if_changed(el, "transform", transform.into(), 0.5);
        batch.set_style_if_changed(el, "transform", transform.into(), 0.5);
        batch.flush(&mut elements);
        assert_eq!(elements.committed_writes(), 1);

        batch.set_style_if_changed(el, "transform", "none".into(), 0.5);
        batch.flush(&mut elements);
        assert_eq!(elements.style(el, "transform"), Some("none"));
    }

    #[test]
    fn flush_empties_the_queue() {
        let mut elements = Elements::new();
        let el = elements.create();
        let mut batch = StyleBatch::new();

        batch.queue_style(el, "opacity", "1".into());
        batch.flush(&mut elements);
        assert_eq!(batch.queued_len(), 0);
        batch.flush(&mut elements);
        assert_eq!(elements.committed_writes(), 1);
    }

    #[test]
    fn clear_forgets_the_cache() {
        let mut elements = Elements::new();
        let el = elements.create();
        let mut batch = StyleBatch::new();

        batch.set_style_if_changed(el, "opacity", "0.5".into(), 0.01);
        batch.flush(&mut elements);
        batch.clear();

        // Same value again: the forgotten cache lets it queue once more,
        // but the arena still sees no effective change.
        batch.set_style_if_changed(el, "opacity", "0.5".into(), 0.01);
        assert_eq!(batch.queued_len(), 1);
        batch.flush(&mut elements);
        assert_eq!(elements.committed_writes(), 1);
    }

    #[test]
    fn parses_leading_numbers() {
        assert_eq!(parse_leading_number("12px"), Some(12.0));
        assert_eq!(parse_leading_number("-45%"), Some(-45.0));
        assert_eq!(parse_leading_number("1.25"), Some(1.25));
        assert_eq!(parse_leading_number("calc(1px)"), None);
        assert_eq!(parse_leading_number(""), None);
    }
}
