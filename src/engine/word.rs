//! Word animator
//!
//! Three sprung channels (scale, vertical offset, glow) plus the fill
//! position sweeping a gradient across the glyphs. Letter-group words
//! suppress their own fill/glow output (delegated to their letters) but
//! still animate scale and offset for group-level motion.
//!
//! In reduced mode only the vertical offset is sprung; fill runs through the
//! configured [`FillStrategy`](crate::engine::fill::FillStrategy) and scale
//! and glow are not produced at all.

use once_cell::sync::Lazy;

use crate::document::Word;
use crate::element::promote_to_gpu;
use crate::engine::AnimCtx;
use crate::engine::fill::{
    FillStrategy, LETTER_GROUP_PREARM_SWEEP_MS, WORD_PREARM_SWEEP_MS, fill_position,
    letter_group_prearm_delay, sweep_animation, word_prearm_delay,
};
use crate::engine::glow::{
    WORD_BLUR_MULT, WORD_OPACITY_MAX, WORD_OPACITY_MULT, apply_glow_style,
};
use crate::engine::spline::{ControlPoint, Spline};
use crate::engine::spring::Spring;
use crate::engine::timing::LyricState;

pub(crate) static SCALE_SPLINE: Lazy<Spline> = Lazy::new(|| {
    Spline::new(&[
        ControlPoint::new(0.0, 0.95),
        ControlPoint::new(0.7, 1.025),
        ControlPoint::new(1.0, 1.0),
    ])
});

pub(crate) static Y_OFFSET_SPLINE: Lazy<Spline> = Lazy::new(|| {
    Spline::new(&[
        ControlPoint::new(0.0, 1.0 / 100.0),
        ControlPoint::new(0.9, -(1.0 / 60.0)),
        ControlPoint::new(1.0, 0.0),
    ])
});

/// Reduced mode keeps the offset sweep monotonic; there is no settle-back.
static SIMPLE_Y_OFFSET_SPLINE: Lazy<Spline> = Lazy::new(|| {
    Spline::new(&[
        ControlPoint::new(0.0, 1.0 / 100.0),
        ControlPoint::new(1.0, -0.04),
    ])
});

pub(crate) static GLOW_SPLINE: Lazy<Spline> = Lazy::new(|| {
    Spline::new(&[
        ControlPoint::new(0.0, 0.0),
        ControlPoint::new(0.15, 1.0),
        ControlPoint::new(0.6, 1.0),
        ControlPoint::new(1.0, 0.0),
    ])
});

pub(crate) const Y_OFFSET_FREQUENCY: f64 = 1.25;
pub(crate) const Y_OFFSET_DAMPING: f64 = 0.4;
pub(crate) const SCALE_FREQUENCY: f64 = 0.7;
pub(crate) const SCALE_DAMPING: f64 = 0.6;
pub(crate) const GLOW_FREQUENCY: f64 = 1.0;
pub(crate) const GLOW_DAMPING: f64 = 0.5;

/// Sprung channels of a word. Channels disabled by reduced mode are never
/// created.
#[derive(Debug, Clone)]
pub struct WordSprings {
    pub scale: Option<Spring>,
    pub y_offset: Spring,
    pub glow: Option<Spring>,
}

/// Build a word's springs at their resting values, so the first rendered
/// frame sits still instead of flying in from a default.
pub(crate) fn create_word_springs(simple: bool) -> WordSprings {
    let y_spline = y_offset_spline(simple);
    let y_offset = Spring::new(y_spline.at(0.0), Y_OFFSET_FREQUENCY, Y_OFFSET_DAMPING);
    if simple {
        WordSprings {
            scale: None,
            y_offset,
            glow: None,
        }
    } else {
        WordSprings {
            scale: Some(Spring::new(
                SCALE_SPLINE.at(0.0),
                SCALE_FREQUENCY,
                SCALE_DAMPING,
            )),
            y_offset,
            glow: Some(Spring::new(
                GLOW_SPLINE.at(0.0),
                GLOW_FREQUENCY,
                GLOW_DAMPING,
            )),
        }
    }
}

pub(crate) fn y_offset_spline(simple: bool) -> &'static Spline {
    if simple {
        &SIMPLE_Y_OFFSET_SPLINE
    } else {
        &Y_OFFSET_SPLINE
    }
}

fn state_target(spline: &Spline, state: LyricState, progress: f64) -> f64 {
    match state {
        LyricState::NotSung => spline.at(0.0),
        LyricState::Active => spline.at(progress),
        LyricState::Sung => spline.at(1.0),
    }
}

/// Animate one word for the current tick: lazy store creation, per-state
/// goals, spring stepping, and channel writes.
pub(crate) fn animate_word(
    ctx: &mut AnimCtx<'_>,
    words: &mut [Word],
    line_index: usize,
    word_index: usize,
    state: LyricState,
    progress: f64,
) {
    let simple = ctx.options.simple_mode;

    let (element, is_letter_group, glow) = {
        let word = &mut words[word_index];
        if word.springs.is_none() {
            promote_to_gpu(ctx.elements, word.element);
        }
        let springs = word
            .springs
            .get_or_insert_with(|| create_word_springs(simple));

        springs
            .y_offset
            .set_target(state_target(y_offset_spline(simple), state, progress));
        let y = springs.y_offset.step(ctx.dt);
        ctx.batch.queue_style(
            word.element,
            "transform",
            format!("translate3d(0, calc(var(--lyrics-size) * {y}), 0)"),
        );

        if let Some(scale) = springs.scale.as_mut() {
            scale.set_target(state_target(&SCALE_SPLINE, state, progress));
            let s = scale.step(ctx.dt);
            ctx.batch.queue_style(word.element, "scale", format!("{s}"));
        }

        let glow = springs.glow.as_mut().map(|g| {
            g.set_target(state_target(&GLOW_SPLINE, state, progress));
            g.step(ctx.dt)
        });

        (word.element, word.letter_group, glow)
    };

    if !is_letter_group {
        write_word_fill(ctx, words, line_index, word_index, state, progress);
        if let Some(glow) = glow {
            apply_glow_style(
                ctx.batch,
                element,
                glow,
                WORD_BLUR_MULT,
                WORD_OPACITY_MULT,
                WORD_OPACITY_MAX,
            );
        }
    }
}

/// Write a word's fill position through the active strategy, arming the
/// follow-up keyframe where the strategy calls for it.
fn write_word_fill(
    ctx: &mut AnimCtx<'_>,
    words: &mut [Word],
    line_index: usize,
    word_index: usize,
    state: LyricState,
    progress: f64,
) {
    let simple = ctx.options.simple_mode;
    let fill = fill_position(state, progress, simple);
    let element = words[word_index].element;

    if !simple {
        ctx.elements
            .set_style(element, "--gradient-position", format!("{fill}%"));
        return;
    }

    match ctx.options.fill_strategy {
        FillStrategy::Calculate => {
            if state != LyricState::Active || !words[word_index].fill_animated {
                ctx.elements
                    .set_style(element, "--fill-position", format!("{fill}%"));
            }
        }
        FillStrategy::Animate => match state {
            LyricState::Active => {
                if !words[word_index].fill_animated {
                    let total = words[word_index].total_time_ms;
                    ctx.elements.remove_style(element, "--fill-position");
                    ctx.elements
                        .set_style(element, "animation", sweep_animation(total));
                    words[word_index].fill_animated = true;
                    words[word_index].pre_fill_armed = false;

                    if let Some(next) = words.get_mut(word_index + 1)
                        && !next.pre_fill_armed
                    {
                        next.pre_fill_armed = true;
                        let next_element = next.element;
                        ctx.elements.remove_style(next_element, "--fill-position");
                        ctx.prearms.schedule(
                            ctx.clock_ms,
                            word_prearm_delay(total),
                            line_index,
                            word_index + 1,
                            WORD_PREARM_SWEEP_MS,
                        );
                    }
                }
            }
            LyricState::NotSung => {
                let word = &mut words[word_index];
                if !word.pre_fill_armed {
                    ctx.elements
                        .set_style(word.element, "animation", "none".to_owned());
                    ctx.elements
                        .set_style(word.element, "--fill-position", "-50%".to_owned());
                }
                word.fill_animated = false;
            }
            LyricState::Sung => {
                let word = &mut words[word_index];
                ctx.elements
                    .set_style(word.element, "animation", "none".to_owned());
                ctx.elements
                    .set_style(word.element, "--fill-position", "100%".to_owned());
                word.fill_animated = false;
                word.pre_fill_armed = false;
            }
        },
    }
}

/// When an active letter group is followed by a plain word, arm that word's
/// keyframe ahead of time so its sweep starts without latency.
pub(crate) fn prearm_letter_group_follower(
    ctx: &mut AnimCtx<'_>,
    words: &mut [Word],
    line_index: usize,
    word_index: usize,
    state: LyricState,
) {
    if !ctx.options.simple_mode
        || ctx.options.fill_strategy != FillStrategy::Animate
        || state != LyricState::Active
        || !words[word_index].letter_group
    {
        return;
    }

    let total = words[word_index].total_time_ms;
    if let Some(next) = words.get_mut(word_index + 1)
        && !next.letter_group
        && !next.pre_fill_armed
    {
        next.pre_fill_armed = true;
        let next_element = next.element;
        ctx.elements.remove_style(next_element, "--fill-position");
        ctx.prearms.schedule(
            ctx.clock_ms,
            letter_group_prearm_delay(total),
            line_index,
            word_index + 1,
            LETTER_GROUP_PREARM_SWEEP_MS,
        );
    }
}

/// Settle a word of a just-sung line toward its terminal targets. Only
/// words that already own springs keep stepping; nothing is created here.
pub(crate) fn animate_word_sung(ctx: &mut AnimCtx<'_>, word: &mut Word) {
    if word.dot {
        return;
    }
    let Some(springs) = word.springs.as_mut() else {
        return;
    };
    let simple = ctx.options.simple_mode;

    springs
        .y_offset
        .set_target(y_offset_spline(simple).at(1.0));
    let y = springs.y_offset.step(ctx.dt);
    ctx.batch.queue_style(
        word.element,
        "transform",
        format!("translate3d(0, calc(var(--lyrics-size) * {y}), 0)"),
    );
    if let Some(scale) = springs.scale.as_mut() {
        scale.set_target(SCALE_SPLINE.at(1.0));
        let s = scale.step(ctx.dt);
        ctx.batch.queue_style(word.element, "scale", format!("{s}"));
    }

    if !word.letter_group {
        if simple {
            ctx.elements
                .set_style(word.element, "animation", "none".to_owned());
            ctx.elements
                .set_style(word.element, "--fill-position", "100%".to_owned());
        } else {
            ctx.elements
                .set_style(word.element, "--gradient-position", "100%".to_owned());
        }
        if let Some(glow) = springs.glow.as_mut() {
            glow.set_target(GLOW_SPLINE.at(1.0));
            let g = glow.step(ctx.dt);
            apply_glow_style(
                ctx.batch,
                word.element,
                g,
                WORD_BLUR_MULT,
                WORD_OPACITY_MULT,
                WORD_OPACITY_MAX,
            );
        }
    }
}
