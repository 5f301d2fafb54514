//! lyricwave - karaoke-style lyrics animation
//!
//! A real-time animation engine for sub-second-accurate highlighting of
//! timed lyrics in sync with an external playback clock. Fetching and
//! parsing are upstream concerns: the engine receives an already-parsed,
//! time-tagged document once per song and a playback position once per
//! render frame, and emits batched semantic style mutations (scale,
//! vertical offset, glow, fill position, proximity blur) on the host's
//! visual elements.
//!
//! ```no_run
//! use lyricwave::{Elements, Line, LyricsAnimator, LyricsDocument, Word};
//!
//! let mut elements = Elements::new();
//! let line_el = elements.create_with_geometry(0.0, 48.0);
//! let word_el = elements.create();
//! let document = LyricsDocument::syllable(vec![Line::new(
//!     0.0,
//!     1000.0,
//!     line_el,
//!     vec![Word::new(0.0, 1000.0, word_el)],
//! )]);
//!
//! let mut animator = LyricsAnimator::default();
//! animator.load(document, elements);
//!
//! // Once per host render frame:
//! animator.animate(position_ms());
//! # fn position_ms() -> f64 { 0.0 }
//! ```

pub mod document;
pub mod element;
pub mod engine;

pub use document::{Letter, Line, LyricsDocument, SyncKind, Word};
pub use element::{Element, ElementId, Elements};
pub use engine::fill::FillStrategy;
pub use engine::spline::{ControlPoint, Spline};
pub use engine::spring::Spring;
pub use engine::timing::{LyricState, classify, progress};
pub use engine::viewport::{ActiveWindowTracker, ScrollMetrics, ViewportTracker};
pub use engine::{
    ActiveEntity, AnimatorConfig, ChannelStrength, ExternalRenderer, LetterEffectsConfig,
    LyricsAnimator, RenderOptions, ViewMode,
};
