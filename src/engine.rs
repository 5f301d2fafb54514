//! Karaoke lyrics animation engine
//!
//! A per-frame simulation that classifies timed entities into a three-state
//! lifecycle against a moving (and freely seekable) playback cursor, drives
//! independent damped-spring channels per active entity, bounds the work on
//! long documents through windowed culling, and batches visual writes behind
//! a change-detection layer.
//!
//! ## Key components
//!
//! - [`LyricsAnimator`]: engine state, song-change reset, and the per-tick
//!   frame driver
//! - [`spring::Spring`]: closed-form damped oscillator, one per channel
//! - [`spline::Spline`]: shared easing curves mapping progress to targets
//! - [`timing`]: the pure three-state classifier
//! - [`style_batch::StyleBatch`]: end-of-frame committed, deduplicated writes
//! - [`viewport`]: scroll-geometry and active-window culling variants
//! - [`word`] / [`letter`] / [`dot`] / [`line`]: per-entity-type animators
//!
//! The host calls [`LyricsAnimator::animate`] once per render frame with the
//! current playback position; nothing else calls into the engine except
//! document load and reset.

pub mod dot;
pub mod fill;
pub mod glow;
pub mod letter;
pub mod line;
pub mod spline;
pub mod spring;
pub mod style_batch;
pub mod timing;
pub mod viewport;
pub mod word;

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::{Line, LyricsDocument, SyncKind};
use crate::element::{Elements, promote_to_gpu_with_filter};
use crate::engine::dot::animate_dot;
use crate::engine::fill::{FillStrategy, PreArmQueue, prearm_animation};
use crate::engine::letter::{
    animate_letters_active, animate_letters_not_sung, animate_letters_sung,
    animate_letters_sung_line,
};
use crate::engine::line::{animate_flat_line, set_line_state_class};
use crate::engine::style_batch::StyleBatch;
use crate::engine::timing::{LyricState, classify, progress};
use crate::engine::viewport::{ActiveWindowTracker, ScrollMetrics, ViewportTracker};
use crate::engine::word::{
    animate_word, animate_word_sung, prearm_letter_group_follower,
};

/// Per-channel strength multipliers for reduced-mode letter effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelStrength {
    pub scale: f64,
    pub y_offset: f64,
    pub glow: f64,
}

impl Default for ChannelStrength {
    fn default() -> Self {
        Self {
            scale: 1.0,
            y_offset: 1.0,
            glow: 1.0,
        }
    }
}

/// Reduced-mode letter effect strengths, selected by word duration so short
/// words flick and long words bloom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LetterEffectsConfig {
    /// Words longer than this (ms) use the `longer` strengths.
    pub longer_than_ms: f64,
    pub longer: ChannelStrength,
    pub shorter: ChannelStrength,
}

impl Default for LetterEffectsConfig {
    fn default() -> Self {
        Self {
            longer_than_ms: 1000.0,
            longer: ChannelStrength::default(),
            shorter: ChannelStrength {
                scale: 0.7,
                y_offset: 0.55,
                glow: 0.8,
            },
        }
    }
}

impl LetterEffectsConfig {
    /// Strength set for a word; full mode always animates at full strength.
    pub(crate) fn strength(&self, simple: bool, word_duration_ms: f64) -> ChannelStrength {
        if !simple {
            ChannelStrength::default()
        } else if word_duration_ms > self.longer_than_ms {
            self.longer
        } else {
            self.shorter
        }
    }
}

/// Engine tuning. All timing values are in milliseconds, blur distances in
/// logical pixels per line of index distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    // === Playback alignment ===
    /// Fixed offset added to every incoming position.
    pub time_offset_ms: f64,
    /// Correction subtracted in reduced mode.
    pub simple_mode_correction_ms: f64,

    // === Proximity blur ===
    /// Blur per line of distance from the active line (full view).
    pub blur_multiplier: f64,
    /// Blur per line of distance in the sidebar view.
    pub sidebar_blur_multiplier: f64,

    // === Culling ===
    /// Extra lines kept on both sides of the scroll-derived window.
    pub viewport_buffer: usize,
    /// Frames between scroll-geometry window refreshes.
    pub viewport_refresh_frames: u32,
    /// Half-width of the active-centered window (sidebar view).
    pub active_window_buffer: usize,

    // === Frame pacing ===
    /// Minimum interval between walks in capped (sidebar) contexts.
    pub frame_interval_ms: f64,

    // === Letter effects ===
    pub letter_effects: LetterEffectsConfig,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            time_offset_ms: 0.0,
            simple_mode_correction_ms: 33.5,
            blur_multiplier: 2.0,
            sidebar_blur_multiplier: 1.25,
            viewport_buffer: 3,
            viewport_refresh_frames: 5,
            active_window_buffer: 5,
            frame_interval_ms: 1000.0 / 50.0,
            letter_effects: LetterEffectsConfig::default(),
        }
    }
}

/// Which surface the lyrics render in. The sidebar variant caps the frame
/// rate and derives its culling window from the active line instead of
/// scroll geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Full,
    Sidebar,
}

/// Mode flags read by the frame driver. Pick these before loading a
/// document; switching strategies mid-song restarts fill triggers from
/// scratch on the next pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Reduced-motion rendering: offset-only word motion, opacity-only
    /// dots, no flat-line glow.
    pub simple_mode: bool,
    pub fill_strategy: FillStrategy,
    pub view: ViewMode,
}

/// Alternate lyrics renderer that fully replaces the built-in walk while
/// installed. The driver keeps its play state in sync and forwards the
/// adjusted position every tick.
pub trait ExternalRenderer {
    fn pause(&mut self);
    fn resume(&mut self);
    fn set_current_time(&mut self, position_ms: f64);
    fn update(&mut self, position_ms: f64);
}

/// Deepest entity currently active, by document path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveEntity {
    Line { line: usize },
    Word { line: usize, word: usize },
    LetterGroup { line: usize, word: usize },
    Letter { line: usize, word: usize, letter: usize },
    Dot { line: usize, word: usize },
}

/// Shared mutable state handed to the per-entity animators for one tick.
pub(crate) struct AnimCtx<'a> {
    pub elements: &'a mut Elements,
    pub batch: &'a mut StyleBatch,
    pub prearms: &'a mut PreArmQueue,
    pub options: RenderOptions,
    pub letter_effects: &'a LetterEffectsConfig,
    /// Engine wall clock, for scheduling deferred pre-arms.
    pub clock_ms: f64,
    /// Seconds since the last executed walk.
    pub dt: f64,
}

/// The animation engine: owns the document, the element arena, and every
/// cache the per-frame walk relies on. [`LyricsAnimator::reset`] tears all
/// of it down in one reviewable operation.
pub struct LyricsAnimator {
    config: AnimatorConfig,
    options: RenderOptions,
    document: Option<LyricsDocument>,
    elements: Elements,
    batch: StyleBatch,
    viewport: ViewportTracker,
    active_window: ActiveWindowTracker,
    prearms: PreArmQueue,
    scroll_metrics: Option<ScrollMetrics>,
    /// Active index the proximity blur was last computed for.
    last_blurred_line: Option<usize>,
    /// Side-channel consumed by scroll-to-active-line.
    active_line: Option<usize>,
    /// Engine wall clock in ms, advanced by tick deltas.
    clock_ms: f64,
    /// Delta time carried over from frame-capped (skipped) ticks.
    carry_dt: f64,
    /// Wall clock of the last executed walk, for the frame cap.
    last_walk_ms: f64,
    last_instant: Option<Instant>,
    external: Option<Box<dyn ExternalRenderer>>,
    external_playing: Option<bool>,
    is_playing: bool,
}

impl Default for LyricsAnimator {
    fn default() -> Self {
        Self::new(AnimatorConfig::default())
    }
}

impl LyricsAnimator {
    pub fn new(config: AnimatorConfig) -> Self {
        let viewport = ViewportTracker::new(config.viewport_refresh_frames, config.viewport_buffer);
        let active_window = ActiveWindowTracker::new(config.active_window_buffer);
        Self {
            config,
            options: RenderOptions::default(),
            document: None,
            elements: Elements::new(),
            batch: StyleBatch::new(),
            viewport,
            active_window,
            prearms: PreArmQueue::default(),
            scroll_metrics: None,
            last_blurred_line: None,
            active_line: None,
            clock_ms: 0.0,
            carry_dt: 0.0,
            last_walk_ms: f64::NEG_INFINITY,
            last_instant: None,
            external: None,
            external_playing: None,
            is_playing: true,
        }
    }

    pub fn with_options(config: AnimatorConfig, options: RenderOptions) -> Self {
        let mut animator = Self::new(config);
        animator.options = options;
        animator
    }

    /// Accept a new document and its element arena, dropping every trace of
    /// the previous song first.
    pub fn load(&mut self, document: LyricsDocument, elements: Elements) {
        self.reset();
        debug!(
            lines = document.lines.len(),
            kind = ?document.kind,
            "lyrics document loaded"
        );
        self.document = Some(document);
        self.elements = elements;
    }

    /// Song-change / explicit teardown: drop all animator stores with the
    /// document, clear the style cache, cancel pending pre-arms, reset both
    /// culling trackers, and null the last-active markers.
    pub fn reset(&mut self) {
        self.document = None;
        self.elements = Elements::new();
        self.batch.clear();
        self.prearms.clear();
        self.viewport.reset();
        self.active_window.reset();
        self.last_blurred_line = None;
        self.active_line = None;
        self.external_playing = None;
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
    }

    /// Host-measured scroll container geometry; `None` disables
    /// scroll-derived culling (everything visible).
    pub fn set_scroll_metrics(&mut self, metrics: Option<ScrollMetrics>) {
        self.scroll_metrics = metrics;
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Install (or remove) an alternate renderer that takes over rendering
    /// entirely while present.
    pub fn set_external_renderer(&mut self, renderer: Option<Box<dyn ExternalRenderer>>) {
        self.external = renderer;
        self.external_playing = None;
    }

    pub fn document(&self) -> Option<&LyricsDocument> {
        self.document.as_ref()
    }

    pub fn elements(&self) -> &Elements {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut Elements {
        &mut self.elements
    }

    /// Index of the line most recently observed active.
    pub fn active_line_index(&self) -> Option<usize> {
        self.active_line
    }

    /// Per-frame entry point: measures delta time from a monotonic clock
    /// and advances the simulation.
    pub fn animate(&mut self, position_ms: f64) {
        let now = Instant::now();
        let dt = self
            .last_instant
            .map(|prev| now.duration_since(prev).as_secs_f64())
            .unwrap_or(0.0);
        self.last_instant = Some(now);
        self.tick(position_ms, dt);
    }

    /// Deterministic core of [`animate`](Self::animate): advance the engine
    /// clock by `dt_seconds` and run one walk at `position_ms`.
    pub fn tick(&mut self, position_ms: f64, dt_seconds: f64) {
        let dt = dt_seconds.max(0.0);
        self.clock_ms += dt * 1000.0;
        self.carry_dt += dt;

        let options = self.options;
        let processed = position_ms + self.config.time_offset_ms
            - if options.simple_mode {
                self.config.simple_mode_correction_ms
            } else {
                0.0
            };

        if self.external.is_some() {
            self.delegate_external(processed);
            return;
        }

        // Secondary-view frame cap; full-view rendering is never capped.
        let limit_frames = options.view == ViewMode::Sidebar && !options.simple_mode;
        if limit_frames && self.clock_ms - self.last_walk_ms < self.config.frame_interval_ms {
            return;
        }
        self.last_walk_ms = self.clock_ms;
        let dt = std::mem::take(&mut self.carry_dt);

        let Some(mut document) = self.document.take() else {
            return;
        };

        // Fire pre-arm keyframes that have come due on the engine clock.
        for arm in self.prearms.drain_due(self.clock_ms) {
            if let Some(word) = document
                .lines
                .get_mut(arm.line)
                .and_then(|l| l.words.get_mut(arm.word))
            {
                self.elements
                    .set_style(word.element, "animation", prearm_animation(arm.sweep_ms));
            }
        }

        // Refresh the scroll-derived culling window at its throttled
        // cadence; the sidebar window follows the active line instead.
        if options.view == ViewMode::Full {
            let boxes: Vec<Option<(f32, f32)>> = document
                .lines
                .iter()
                .map(|l| self.elements.geometry(l.element))
                .collect();
            self.viewport.update(self.scroll_metrics, boxes, false);
        }

        let mut ctx = AnimCtx {
            elements: &mut self.elements,
            batch: &mut self.batch,
            prearms: &mut self.prearms,
            options,
            letter_effects: &self.config.letter_effects,
            clock_ms: self.clock_ms,
            dt,
        };

        let line_count = document.lines.len();
        let credits = document.credits;

        for index in 0..line_count {
            let (line_state, line_element, dot_line, line_start, line_end) = {
                let line = &document.lines[index];
                (
                    classify(processed, line.start_ms, line.end_ms),
                    line.element,
                    line.dot_line,
                    line.start_ms,
                    line.end_ms,
                )
            };

            // Every line gets its cheap lifecycle class, in range or not.
            set_line_state_class(ctx.elements, line_element, line_state);

            if line_state == LyricState::Active {
                self.active_line = Some(index);
                self.active_window.note_active(index);
            }

            let in_range = match options.view {
                ViewMode::Full => self.viewport.contains(index),
                ViewMode::Sidebar => self.active_window.contains(index),
            };
            if !in_range {
                continue;
            }

            match (document.kind, line_state) {
                (SyncKind::Syllable, LyricState::Active) => {
                    if self.last_blurred_line != Some(index) {
                        let multiplier = match options.view {
                            ViewMode::Sidebar => self.config.sidebar_blur_multiplier,
                            ViewMode::Full => self.config.blur_multiplier,
                        };
                        apply_blur_pass(
                            &mut ctx,
                            &document.lines,
                            index,
                            processed,
                            multiplier,
                            self.config.blur_multiplier,
                        );
                        self.last_blurred_line = Some(index);
                    }

                    let words = &mut document.lines[index].words;
                    if words.is_empty() {
                        warn!(line = index, "line has no word entries, skipping sub-animation");
                        continue;
                    }

                    for word_index in 0..words.len() {
                        let (word_state, word_progress, is_dot, is_group, has_letters) = {
                            let word = &words[word_index];
                            (
                                classify(processed, word.start_ms, word.end_ms),
                                progress(processed, word.start_ms, word.end_ms),
                                word.dot,
                                word.letter_group,
                                !word.letters.is_empty(),
                            )
                        };

                        if !is_dot {
                            animate_word(&mut ctx, words, index, word_index, word_state, word_progress);
                            if is_group {
                                prearm_letter_group_follower(
                                    &mut ctx, words, index, word_index, word_state,
                                );
                            }
                        } else if !is_group {
                            animate_dot(&mut ctx, &mut words[word_index], word_state, word_progress);
                        }

                        if is_group {
                            if !has_letters {
                                warn!(
                                    line = index,
                                    word = word_index,
                                    "letter group without letters, skipping letter animation"
                                );
                                continue;
                            }
                            match word_state {
                                LyricState::Active => {
                                    animate_letters_active(&mut ctx, &mut words[word_index], processed)
                                }
                                LyricState::NotSung => {
                                    animate_letters_not_sung(&mut ctx, &mut words[word_index])
                                }
                                LyricState::Sung => {
                                    animate_letters_sung(&mut ctx, &mut words[word_index])
                                }
                            }
                        }
                    }
                }
                (SyncKind::Syllable, LyricState::Sung) => {
                    if index + 1 == line_count
                        && let Some(credits) = credits
                    {
                        ctx.elements.add_class(credits, "Active");
                    }

                    // Keep settling the just-sung line's springs until the
                    // following line has moved on.
                    let settle = match document.lines.get(index + 1) {
                        Some(next) => {
                            let next_state = classify(processed, next.start_ms, next.end_ms);
                            next_state != LyricState::Sung
                        }
                        None => true,
                    };
                    if settle {
                        for word in document.lines[index].words.iter_mut() {
                            if word.springs.is_some() && !word.dot {
                                animate_word_sung(&mut ctx, word);
                            } else if word.dot_springs.is_some() && word.dot && !word.letter_group {
                                animate_dot(&mut ctx, word, LyricState::Sung, 1.0);
                            }
                            if word.letter_group && !word.letters.is_empty() {
                                animate_letters_sung_line(&mut ctx, word);
                            }
                        }
                    }
                }
                (SyncKind::Line, LyricState::Active) => {
                    if self.last_blurred_line != Some(index) {
                        let multiplier = match options.view {
                            ViewMode::Sidebar => self.config.sidebar_blur_multiplier,
                            ViewMode::Full => self.config.blur_multiplier,
                        };
                        apply_blur_pass(
                            &mut ctx,
                            &document.lines,
                            index,
                            processed,
                            multiplier,
                            self.config.blur_multiplier,
                        );
                        self.last_blurred_line = Some(index);
                    }

                    let line_progress = progress(processed, line_start, line_end);
                    if dot_line && !document.lines[index].words.is_empty() {
                        let dots = &mut document.lines[index].words;
                        for dot in dots.iter_mut() {
                            let dot_state = classify(processed, dot.start_ms, dot.end_ms);
                            let dot_progress = progress(processed, dot.start_ms, dot.end_ms);
                            animate_dot(&mut ctx, dot, dot_state, dot_progress);
                        }
                    } else {
                        animate_flat_line(
                            &mut ctx,
                            &mut document.lines[index],
                            line_state,
                            line_progress,
                        );
                    }

                    if let Some(credits) = credits
                        && ctx.elements.has_class(credits, "Active")
                    {
                        ctx.elements.remove_class(credits, "Active");
                    }
                }
                (SyncKind::Line, LyricState::Sung) => {
                    if index + 1 == line_count
                        && let Some(credits) = credits
                    {
                        ctx.elements.add_class(credits, "Active");
                    }
                }
                // NotSung lines already got their class; nothing else runs.
                (_, LyricState::NotSung) => {}
            }
        }

        // Commit every queued style mutation for this tick together.
        self.batch.flush(&mut self.elements);
        self.document = Some(document);
    }

    /// Deepest active entity at `position_ms`, for scroll-to-active-line
    /// and similar consumers.
    pub fn find_active_entity(&self, position_ms: f64) -> Option<ActiveEntity> {
        let document = self.document.as_ref()?;
        let processed = position_ms + self.config.time_offset_ms;

        for (line_index, line) in document.lines.iter().enumerate() {
            if classify(processed, line.start_ms, line.end_ms) != LyricState::Active {
                continue;
            }

            if line.dot_line {
                for (word_index, dot) in line.words.iter().enumerate() {
                    if classify(processed, dot.start_ms, dot.end_ms) == LyricState::Active {
                        return Some(ActiveEntity::Dot {
                            line: line_index,
                            word: word_index,
                        });
                    }
                }
                return Some(ActiveEntity::Line { line: line_index });
            }

            if document.kind == SyncKind::Syllable {
                for (word_index, word) in line.words.iter().enumerate() {
                    if word.dot {
                        continue;
                    }
                    if classify(processed, word.start_ms, word.end_ms) == LyricState::Active {
                        if word.letter_group {
                            for (letter_index, letter) in word.letters.iter().enumerate() {
                                if classify(processed, letter.start_ms, letter.end_ms)
                                    == LyricState::Active
                                {
                                    return Some(ActiveEntity::Letter {
                                        line: line_index,
                                        word: word_index,
                                        letter: letter_index,
                                    });
                                }
                            }
                            return Some(ActiveEntity::LetterGroup {
                                line: line_index,
                                word: word_index,
                            });
                        }
                        return Some(ActiveEntity::Word {
                            line: line_index,
                            word: word_index,
                        });
                    }
                }
            }
            return Some(ActiveEntity::Line { line: line_index });
        }
        None
    }

    fn delegate_external(&mut self, processed: f64) {
        let playing = self.is_playing;
        let Some(renderer) = self.external.as_mut() else {
            return;
        };
        if self.external_playing != Some(playing) {
            if playing {
                renderer.resume();
            } else {
                renderer.pause();
            }
            self.external_playing = Some(playing);
        }
        renderer.set_current_time(processed);
        renderer.update(processed);
    }
}

/// Recompute the proximity blur for every line against a new active index.
///
/// The whole array is walked, not just the culled window: blur is the one
/// effect that must stay coherent across the entire document, and it only
/// runs when the active index changes. The cap is always derived from the
/// full-view multiplier.
fn apply_blur_pass(
    ctx: &mut AnimCtx<'_>,
    lines: &[Line],
    active_index: usize,
    processed: f64,
    multiplier: f64,
    full_multiplier: f64,
) {
    let Some(active) = lines.get(active_index) else {
        return;
    };
    promote_to_gpu_with_filter(ctx.elements, active.element);

    let max = full_multiplier * 5.0 + full_multiplier * 0.465;

    for (index, line) in lines.iter().enumerate() {
        let state = classify(processed, line.start_ms, line.end_ms);
        let distance = active_index.abs_diff(index);
        let value = if state == LyricState::Active || distance == 0 {
            "0px".to_owned()
        } else {
            format!("{}px", (multiplier * distance as f64).min(max))
        };
        ctx.batch
            .set_style_if_changed(line.element, "--blur-amount", value, 0.25);
        promote_to_gpu_with_filter(ctx.elements, line.element);
    }
}
