//! Dot animator for instrumental marker rows
//!
//! Dots share the three-state lifecycle of words but pulse instead of
//! sweeping: their curves are tuned for a breathing rise that holds at full
//! intensity, and they carry a fourth sprung channel for opacity.

use once_cell::sync::Lazy;

use crate::document::Word;
use crate::element::promote_to_gpu;
use crate::engine::AnimCtx;
use crate::engine::glow::{DOT_BLUR_MULT, DOT_OPACITY_MULT, apply_glow_style};
use crate::engine::spline::{ControlPoint, Spline};
use crate::engine::spring::Spring;
use crate::engine::timing::LyricState;

const SCALE_FREQUENCY: f64 = 0.7;
const SCALE_DAMPING: f64 = 0.6;
const Y_OFFSET_FREQUENCY: f64 = 1.25;
const Y_OFFSET_DAMPING: f64 = 0.4;
const GLOW_FREQUENCY: f64 = 1.0;
const GLOW_DAMPING: f64 = 0.5;
const OPACITY_FREQUENCY: f64 = 1.0;
const OPACITY_DAMPING: f64 = 0.5;

static DOT_SCALE_SPLINE: Lazy<Spline> = Lazy::new(|| {
    Spline::new(&[
        ControlPoint::new(0.0, 0.75),
        ControlPoint::new(0.7, 1.05),
        ControlPoint::new(1.0, 1.0),
    ])
});

static DOT_Y_OFFSET_SPLINE: Lazy<Spline> = Lazy::new(|| {
    Spline::new(&[
        ControlPoint::new(0.0, 0.0),
        ControlPoint::new(0.9, -0.12),
        ControlPoint::new(1.0, 0.0),
    ])
});

static DOT_GLOW_SPLINE: Lazy<Spline> = Lazy::new(|| {
    Spline::new(&[
        ControlPoint::new(0.0, 0.0),
        ControlPoint::new(0.6, 1.0),
        ControlPoint::new(1.0, 1.0),
    ])
});

static DOT_OPACITY_SPLINE: Lazy<Spline> = Lazy::new(|| {
    Spline::new(&[
        ControlPoint::new(0.0, 0.35),
        ControlPoint::new(0.6, 1.0),
        ControlPoint::new(1.0, 1.0),
    ])
});

/// Reduced mode starts dots slightly dimmer.
static SIMPLE_DOT_OPACITY_SPLINE: Lazy<Spline> = Lazy::new(|| {
    Spline::new(&[
        ControlPoint::new(0.0, 0.27),
        ControlPoint::new(0.6, 1.0),
        ControlPoint::new(1.0, 1.0),
    ])
});

fn opacity_spline(simple: bool) -> &'static Spline {
    if simple {
        &SIMPLE_DOT_OPACITY_SPLINE
    } else {
        &DOT_OPACITY_SPLINE
    }
}

/// Sprung channels of a dot. Reduced mode keeps only opacity.
#[derive(Debug, Clone)]
pub struct DotSprings {
    pub scale: Option<Spring>,
    pub y_offset: Option<Spring>,
    pub glow: Option<Spring>,
    pub opacity: Spring,
}

fn create_dot_springs(simple: bool) -> DotSprings {
    let opacity = Spring::new(
        opacity_spline(simple).at(0.0),
        OPACITY_FREQUENCY,
        OPACITY_DAMPING,
    );
    if simple {
        DotSprings {
            scale: None,
            y_offset: None,
            glow: None,
            opacity,
        }
    } else {
        DotSprings {
            scale: Some(Spring::new(
                DOT_SCALE_SPLINE.at(0.0),
                SCALE_FREQUENCY,
                SCALE_DAMPING,
            )),
            y_offset: Some(Spring::new(
                DOT_Y_OFFSET_SPLINE.at(0.0),
                Y_OFFSET_FREQUENCY,
                Y_OFFSET_DAMPING,
            )),
            glow: Some(Spring::new(
                DOT_GLOW_SPLINE.at(0.0),
                GLOW_FREQUENCY,
                GLOW_DAMPING,
            )),
            opacity,
        }
    }
}

fn state_target(spline: &Spline, state: LyricState, progress: f64) -> f64 {
    match state {
        LyricState::NotSung => spline.at(0.0),
        LyricState::Active => spline.at(progress),
        LyricState::Sung => spline.at(1.0),
    }
}

/// Animate one dot, shared by syllable and flat-line documents.
pub(crate) fn animate_dot(
    ctx: &mut AnimCtx<'_>,
    dot: &mut Word,
    state: LyricState,
    progress: f64,
) {
    let simple = ctx.options.simple_mode;

    if dot.dot_springs.is_none() {
        promote_to_gpu(ctx.elements, dot.element);
    }
    let springs = dot
        .dot_springs
        .get_or_insert_with(|| create_dot_springs(simple));

    springs
        .opacity
        .set_target(state_target(opacity_spline(simple), state, progress));
    let opacity = springs.opacity.step(ctx.dt);
    ctx.batch
        .queue_style(dot.element, "opacity", format!("{opacity}"));

    if let Some(y_offset) = springs.y_offset.as_mut() {
        y_offset.set_target(state_target(&DOT_Y_OFFSET_SPLINE, state, progress));
        let y = y_offset.step(ctx.dt);
        ctx.batch.queue_style(
            dot.element,
            "transform",
            format!("translate3d(0, calc(var(--lyrics-size) * {y}), 0)"),
        );
    }
    if let Some(scale) = springs.scale.as_mut() {
        scale.set_target(state_target(&DOT_SCALE_SPLINE, state, progress));
        let s = scale.step(ctx.dt);
        ctx.batch.queue_style(dot.element, "scale", format!("{s}"));
    }
    if let Some(glow) = springs.glow.as_mut() {
        glow.set_target(state_target(&DOT_GLOW_SPLINE, state, progress));
        let g = glow.step(ctx.dt);
        apply_glow_style(
            ctx.batch,
            dot.element,
            g,
            DOT_BLUR_MULT,
            DOT_OPACITY_MULT,
            f64::INFINITY,
        );
    }
}
