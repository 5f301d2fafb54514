//! Fill-position strategies and deferred keyframe pre-arming
//!
//! The fill position is the sweep percentage representing how much of a
//! token has been sung; it drives a gradient-style highlight across the
//! glyphs. Two host-configurable strategies produce it:
//!
//! - **Calculate** derives the position from the spring/spline machinery
//!   every frame (smooth, per-frame cost);
//! - **Animate** triggers one discrete, duration-matched keyframe sweep
//!   when a token becomes active, and pre-arms the *next* token's keyframe
//!   on a deferred timer shortly before the current one ends, hiding
//!   start-of-word latency.
//!
//! Both strategies produce identical start and end states; only the
//! interpolation path during the active window differs.
//!
//! Pre-arm timers are tracked in an engine-owned queue drained against the
//! frame clock and cancelled wholesale on reset, so no timer can outlive
//! the document that scheduled it.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};

use crate::engine::timing::LyricState;

/// How the fill position is produced during a token's active window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStrategy {
    /// Continuous per-frame derivation.
    #[default]
    Calculate,
    /// One duration-matched keyframe sweep per activation.
    Animate,
}

/// Fill sweep start percentage: reduced mode starts further off-glyph.
fn resting_fill(simple: bool) -> f64 {
    if simple { -50.0 } else { -20.0 }
}

/// Fill position for a state/progress pair, as a percentage.
pub fn fill_position(state: LyricState, progress: f64, simple: bool) -> f64 {
    match state {
        LyricState::NotSung => resting_fill(simple),
        LyricState::Sung => 100.0,
        LyricState::Active => resting_fill(simple) + 120.0 * progress,
    }
}

/// Keyframe shorthand for the discrete fill sweep of an active token.
pub(crate) fn sweep_animation(duration_ms: f64) -> String {
    format!("fill-sweep {duration_ms}ms linear forwards")
}

/// Keyframe shorthand for pre-arming the next token.
pub(crate) fn prearm_animation(duration_ms: f64) -> String {
    format!("fill-prearm {duration_ms}ms linear forwards")
}

/// Pre-arm delay for a plain word: fire at 60% of the word minus a fixed
/// lead, never negative.
pub fn word_prearm_delay(duration_ms: f64) -> f64 {
    (duration_ms * 0.6 - 22.0).max(0.0)
}

/// Pre-arm delay when the current token is a letter group.
pub fn letter_group_prearm_delay(duration_ms: f64) -> f64 {
    (duration_ms * 0.845 - 130.0).max(0.0)
}

/// Sweep duration of the pre-arm keyframe following a plain word.
pub(crate) const WORD_PREARM_SWEEP_MS: f64 = 125.0;
/// Sweep duration of the pre-arm keyframe following a letter group.
pub(crate) const LETTER_GROUP_PREARM_SWEEP_MS: f64 = 250.0;

/// One scheduled pre-arm, addressed by document path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PreArm {
    pub fire_at_ms: f64,
    pub line: usize,
    pub word: usize,
    pub sweep_ms: f64,
}

/// Engine-owned queue of pending pre-arms.
#[derive(Debug, Default)]
pub(crate) struct PreArmQueue {
    pending: Vec<PreArm>,
}

impl PreArmQueue {
    pub fn schedule(&mut self, now_ms: f64, delay_ms: f64, line: usize, word: usize, sweep_ms: f64) {
        self.pending.push(PreArm {
            fire_at_ms: now_ms + delay_ms.max(0.0),
            line,
            word,
            sweep_ms,
        });
    }

    /// Remove and return every pre-arm due at `now_ms`.
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<PreArm> {
        let mut due = Vec::new();
        self.pending.retain(|arm| {
            if arm.fire_at_ms <= now_ms {
                due.push(*arm);
                false
            } else {
                true
            }
        });
        due
    }

    /// Cancel everything (teardown, song change, reset).
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_formula_full_mode() {
        assert_eq!(fill_position(LyricState::NotSung, 0.0, false), -20.0);
        assert_eq!(fill_position(LyricState::Sung, 1.0, false), 100.0);
        assert_eq!(fill_position(LyricState::Active, 0.5, false), 40.0);
        assert_eq!(fill_position(LyricState::Active, 1.0, false), 100.0);
    }

    #[test]
    fn fill_formula_reduced_mode() {
        assert_eq!(fill_position(LyricState::NotSung, 0.0, true), -50.0);
        assert_eq!(fill_position(LyricState::Active, 0.5, true), 10.0);
        assert_eq!(fill_position(LyricState::Active, 1.0, true), 70.0);
        assert_eq!(fill_position(LyricState::Sung, 1.0, true), 100.0);
    }

    #[test]
    fn prearm_delays_keep_their_formulas() {
        assert!((word_prearm_delay(1000.0) - 578.0).abs() < 1e-9);
        assert!((letter_group_prearm_delay(2000.0) - 1560.0).abs() < 1e-9);
    }

    #[test]
    fn prearm_delays_clamp_to_zero_for_short_tokens() {
        assert_eq!(word_prearm_delay(30.0), 0.0);
        assert_eq!(letter_group_prearm_delay(100.0), 0.0);
    }

    #[test]
    fn queue_fires_only_due_arms() {
        let mut queue = PreArmQueue::default();
        queue.schedule(0.0, 500.0, 0, 1, WORD_PREARM_SWEEP_MS);
        queue.schedule(0.0, 900.0, 0, 2, WORD_PREARM_SWEEP_MS);

        assert!(queue.drain_due(400.0).is_empty());
        let due = queue.drain_due(600.0);
        assert_eq!(due.len(), 1);
        assert_eq!((due[0].line, due[0].word), (0, 1));
        assert_eq!(queue.len(), 1);

        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.drain_due(10_000.0).is_empty());
    }
}
