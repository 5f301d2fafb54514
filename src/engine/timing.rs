//! Lifecycle classification against the playback cursor
//!
//! State is a pure function of the current time and an entity's own bounds.
//! There is no memory, so seeking in either direction is always correct
//! without reset logic. These helpers run for every in-range entity at every
//! level of the hierarchy each frame; both are branch-light and
//! allocation-free.

use serde::{Deserialize, Serialize};

/// Three-state lifecycle of a timed entity relative to the playback cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LyricState {
    NotSung,
    Active,
    Sung,
}

/// Classify `now` against an entity's `[start, end]` window (milliseconds).
#[inline]
pub fn classify(now: f64, start: f64, end: f64) -> LyricState {
    if now < start {
        LyricState::NotSung
    } else if now > end {
        LyricState::Sung
    } else {
        LyricState::Active
    }
}

/// Clamped linear fraction through the interval.
#[inline]
pub fn progress(now: f64, start: f64, end: f64) -> f64 {
    if now <= start {
        0.0
    } else if now >= end {
        1.0
    } else {
        (now - start) / (end - start)
    }
}
