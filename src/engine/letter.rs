//! Letter animator for letter-group words
//!
//! Letters do not trigger independently: every letter's channel goal is
//! blended between its own state-appropriate value and the resting value by
//! a falloff based on index distance from the currently active letter. The
//! result is a wave that ripples outward rather than a row of isolated
//! pops.
//!
//! Reduced mode additionally scales each channel by a strength multiplier
//! picked from the word's duration, so short words flick and long words
//! bloom.

use once_cell::sync::Lazy;

use crate::document::{Letter, Word};
use crate::element::promote_to_gpu;
use crate::engine::AnimCtx;
use crate::engine::fill::{FillStrategy, sweep_animation};
use crate::engine::glow::{LETTER_BLUR_MULT, LETTER_OPACITY_MULT, apply_glow_style};
use crate::engine::spline::{ControlPoint, Spline};
use crate::engine::spring::Spring;
use crate::engine::timing::{LyricState, classify, progress};
use crate::engine::word::{
    GLOW_DAMPING, GLOW_FREQUENCY, GLOW_SPLINE, SCALE_DAMPING, SCALE_FREQUENCY, SCALE_SPLINE,
    Y_OFFSET_DAMPING, Y_OFFSET_FREQUENCY,
};

/// Glow progress a sung letter settles at while its word is still active.
const SUNG_LETTER_GLOW: f64 = 0.2;

/// Falloff steepness per letter of distance from the active letter.
const PROXIMITY_FALLOFF: f64 = 0.9;

static LETTER_Y_OFFSET_SPLINE: Lazy<Spline> = Lazy::new(|| {
    Spline::new(&[
        ControlPoint::new(0.0, 1.0 / 100.0),
        ControlPoint::new(0.9, -(1.0 / 60.0)),
        ControlPoint::new(1.0, 0.0),
    ])
});

fn ease_sin_out(t: f64) -> f64 {
    (t * std::f64::consts::FRAC_PI_2).sin()
}

/// Sprung channels of a single letter. Letters always carry all three;
/// reduced mode attenuates their targets instead of removing channels.
#[derive(Debug, Clone)]
pub struct LetterSprings {
    pub scale: Spring,
    pub y_offset: Spring,
    pub glow: Spring,
}

fn create_letter_springs() -> LetterSprings {
    LetterSprings {
        scale: Spring::new(SCALE_SPLINE.at(0.0), SCALE_FREQUENCY, SCALE_DAMPING),
        y_offset: Spring::new(
            LETTER_Y_OFFSET_SPLINE.at(0.0),
            Y_OFFSET_FREQUENCY,
            Y_OFFSET_DAMPING,
        ),
        glow: Spring::new(GLOW_SPLINE.at(0.0), GLOW_FREQUENCY, GLOW_DAMPING),
    }
}

fn ensure_springs(ctx: &mut AnimCtx<'_>, letter: &mut Letter) {
    if letter.springs.is_none() {
        promote_to_gpu(ctx.elements, letter.element);
        letter.springs = Some(create_letter_springs());
    }
}

/// Blend a channel goal between its resting value and the active-state
/// value by index distance from the active letter.
fn proximity_target(resting: f64, base: f64, distance: usize) -> f64 {
    let falloff = (1.0 / (1.0 + distance as f64 * PROXIMITY_FALLOFF)).max(0.0);
    resting + (base - resting) * falloff
}

/// Per-channel target values for one letter this tick.
struct LetterGoals {
    scale: f64,
    y_offset: f64,
    glow: f64,
    gradient: f64,
}

/// Step a letter's springs and emit its channel writes.
fn apply_letter_styles(
    ctx: &mut AnimCtx<'_>,
    letter: &mut Letter,
    goals: &LetterGoals,
    state: LyricState,
) {
    let Some(springs) = letter.springs.as_mut() else {
        return;
    };
    springs.scale.set_target(goals.scale);
    springs.y_offset.set_target(goals.y_offset);
    springs.glow.set_target(goals.glow);
    let scale = springs.scale.step(ctx.dt);
    let y = springs.y_offset.step(ctx.dt);
    let glow = springs.glow.step(ctx.dt);

    // Fill path
    if ctx.options.simple_mode {
        match ctx.options.fill_strategy {
            FillStrategy::Calculate => {
                ctx.elements.set_style(
                    letter.element,
                    "--fill-position",
                    format!("{}%", goals.gradient),
                );
            }
            FillStrategy::Animate => match state {
                LyricState::Active => {
                    if !letter.fill_animated {
                        let total = letter.end_ms - letter.start_ms;
                        ctx.elements.remove_style(letter.element, "--fill-position");
                        ctx.elements
                            .set_style(letter.element, "animation", sweep_animation(total));
                        letter.fill_animated = true;
                    }
                }
                LyricState::NotSung => {
                    if !letter.pre_fill_armed {
                        ctx.elements
                            .set_style(letter.element, "animation", "none".to_owned());
                        ctx.elements.set_style(
                            letter.element,
                            "--fill-position",
                            "-50%".to_owned(),
                        );
                    }
                    letter.fill_animated = false;
                }
                LyricState::Sung => {
                    ctx.elements
                        .set_style(letter.element, "animation", "none".to_owned());
                    ctx.elements.set_style(
                        letter.element,
                        "--fill-position",
                        "100%".to_owned(),
                    );
                    letter.fill_animated = false;
                }
            },
        }
    } else {
        ctx.elements.set_style(
            letter.element,
            "--gradient-position",
            format!("{}%", goals.gradient),
        );
    }

    // Letters double the offset channel for a deeper arc than their word.
    ctx.batch.queue_style(
        letter.element,
        "transform",
        format!("translate3d(0, calc(var(--lyrics-size) * {}), 0)", y * 2.0),
    );
    ctx.batch
        .queue_style(letter.element, "scale", format!("{scale}"));
    apply_glow_style(
        ctx.batch,
        letter.element,
        glow,
        LETTER_BLUR_MULT,
        LETTER_OPACITY_MULT,
        f64::INFINITY,
    );
}

/// Animate the letters of an active word, rippling outward from whichever
/// letter is active right now.
pub(crate) fn animate_letters_active(ctx: &mut AnimCtx<'_>, word: &mut Word, position: f64) {
    let simple = ctx.options.simple_mode;
    let word_progress = progress(position, word.start_ms, word.end_ms);
    let word_duration = word.total_time_ms;

    // Locate the active letter by ordered scan.
    let mut active_index: Option<usize> = None;
    let mut active_progress = 0.0;
    for (i, letter) in word.letters.iter().enumerate() {
        if classify(position, letter.start_ms, letter.end_ms) == LyricState::Active {
            active_index = Some(i);
            active_progress = progress(position, letter.start_ms, letter.end_ms);
            break;
        }
    }

    let resting_fill = if simple { -50.0 } else { -20.0 };

    for k in 0..word.letters.len() {
        let letter_state = {
            let letter = &word.letters[k];
            classify(position, letter.start_ms, letter.end_ms)
        };
        ensure_springs(ctx, &mut word.letters[k]);

        let mut scale = SCALE_SPLINE.at(0.0);
        let mut y_offset = LETTER_Y_OFFSET_SPLINE.at(0.0);
        let mut glow = GLOW_SPLINE.at(0.0);

        if let Some(active) = active_index {
            let count = if simple { word_progress } else { active_progress };
            let strength = ctx.letter_effects.strength(simple, word_duration);
            let base_scale = SCALE_SPLINE.at(count) * strength.scale;
            let base_y = LETTER_Y_OFFSET_SPLINE.at(count) * strength.y_offset;
            let base_glow = GLOW_SPLINE.at(count) * strength.glow;

            let distance = active.abs_diff(k);
            scale = proximity_target(SCALE_SPLINE.at(0.0), base_scale, distance);
            y_offset = proximity_target(LETTER_Y_OFFSET_SPLINE.at(0.0), base_y, distance);
            glow = proximity_target(GLOW_SPLINE.at(0.0), base_glow, distance);
        }

        // Per-letter overrides on top of the ripple.
        if letter_state == LyricState::NotSung && !simple {
            scale = SCALE_SPLINE.at(0.0);
            y_offset = LETTER_Y_OFFSET_SPLINE.at(0.0);
            glow = GLOW_SPLINE.at(0.0);
        } else if letter_state == LyricState::Sung && active_index.is_none() {
            glow = GLOW_SPLINE.at(SUNG_LETTER_GLOW);
        }

        let gradient = match letter_state {
            LyricState::NotSung => resting_fill,
            LyricState::Sung => 100.0,
            LyricState::Active => {
                if active_index == Some(k) {
                    resting_fill + 120.0 * ease_sin_out(active_progress)
                } else {
                    resting_fill
                }
            }
        };

        let goals = LetterGoals {
            scale,
            y_offset,
            glow,
            gradient,
        };
        apply_letter_styles(ctx, &mut word.letters[k], &goals, letter_state);
    }
}

/// All letters at rest while their word has not been reached.
pub(crate) fn animate_letters_not_sung(ctx: &mut AnimCtx<'_>, word: &mut Word) {
    let simple = ctx.options.simple_mode;
    let gradient = if simple { -50.0 } else { -20.0 };

    for letter in &mut word.letters {
        ensure_springs(ctx, letter);
        if simple {
            ctx.elements
                .set_style(letter.element, "animation", "none".to_owned());
            ctx.elements
                .set_style(letter.element, "--fill-position", "-50%".to_owned());
        }
        let goals = LetterGoals {
            scale: SCALE_SPLINE.at(0.0),
            y_offset: LETTER_Y_OFFSET_SPLINE.at(0.0),
            glow: GLOW_SPLINE.at(0.0),
            gradient,
        };
        apply_letter_styles(ctx, letter, &goals, LyricState::NotSung);
    }
}

/// All letters at their end positions once their word has passed.
pub(crate) fn animate_letters_sung(ctx: &mut AnimCtx<'_>, word: &mut Word) {
    let simple = ctx.options.simple_mode;
    for letter in &mut word.letters {
        ensure_springs(ctx, letter);
        if simple {
            ctx.elements
                .set_style(letter.element, "animation", "none".to_owned());
            ctx.elements
                .set_style(letter.element, "--fill-position", "100%".to_owned());
        }
        let goals = LetterGoals {
            scale: SCALE_SPLINE.at(1.0),
            y_offset: LETTER_Y_OFFSET_SPLINE.at(1.0),
            glow: GLOW_SPLINE.at(1.0),
            gradient: 100.0,
        };
        apply_letter_styles(ctx, letter, &goals, LyricState::Sung);
    }
}

/// Settle pass for letters of a just-sung line. Glow writes bypass the
/// change cache here so the terminal values always land.
pub(crate) fn animate_letters_sung_line(ctx: &mut AnimCtx<'_>, word: &mut Word) {
    let simple = ctx.options.simple_mode;
    for letter in &mut word.letters {
        ensure_springs(ctx, letter);
        let Some(springs) = letter.springs.as_mut() else {
            continue;
        };
        springs.scale.set_target(SCALE_SPLINE.at(1.0));
        springs.y_offset.set_target(LETTER_Y_OFFSET_SPLINE.at(1.0));
        springs.glow.set_target(GLOW_SPLINE.at(1.0));
        let scale = springs.scale.step(ctx.dt);
        let y = springs.y_offset.step(ctx.dt);
        let glow = springs.glow.step(ctx.dt);

        if simple {
            ctx.elements
                .set_style(letter.element, "animation", "none".to_owned());
            ctx.elements
                .set_style(letter.element, "--fill-position", "100%".to_owned());
        } else {
            ctx.elements
                .set_style(letter.element, "--gradient-position", "100%".to_owned());
        }
        ctx.batch.queue_style(
            letter.element,
            "transform",
            format!("translate3d(0, calc(var(--lyrics-size) * {}), 0)", y * 2.0),
        );
        ctx.batch
            .queue_style(letter.element, "scale", format!("{scale}"));
        ctx.elements.set_style(
            letter.element,
            "--text-shadow-blur-radius",
            format!("{}px", 4.0 + 12.0 * glow),
        );
        ctx.elements.set_style(
            letter.element,
            "--text-shadow-opacity",
            format!("{}%", glow * LETTER_OPACITY_MULT),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falloff_decreases_strictly_with_distance() {
        let resting = 0.95;
        let base = 1.025;
        let mut prev = proximity_target(resting, base, 0);
        assert_eq!(prev, base);
        for distance in 1..=5 {
            let v = proximity_target(resting, base, distance);
            assert!(v < prev, "ripple should weaken with distance");
            assert!(v > resting, "ripple never undershoots the resting value");
            prev = v;
        }
    }

    #[test]
    fn distant_letter_goal_lies_between_rest_and_active() {
        // Letter 2 active, letter 4 two steps away.
        let resting = SCALE_SPLINE.at(0.0);
        let active = SCALE_SPLINE.at(0.5);
        let goal = proximity_target(resting, active, 2);
        assert!(goal > resting.min(active) && goal < resting.max(active));
    }

    #[test]
    fn ease_sin_out_endpoints() {
        assert!((ease_sin_out(0.0) - 0.0).abs() < 1e-12);
        assert!((ease_sin_out(1.0) - 1.0).abs() < 1e-12);
        assert!(ease_sin_out(0.5) > 0.5, "sine ease front-loads progress");
    }
}
