//! Flat-mode line animator and lifecycle state classes
//!
//! When only line-level timing exists there is no per-word animation; a
//! single glow spring plus a directly-set (unsprung) gradient position carry
//! the whole highlight.
//!
//! The lifecycle class update is the one piece of work every line receives
//! every frame, in or out of the viewport range.

use once_cell::sync::Lazy;

use crate::document::Line;
use crate::element::{ElementId, Elements};
use crate::engine::AnimCtx;
use crate::engine::spline::{ControlPoint, Spline};
use crate::engine::spring::Spring;
use crate::engine::timing::LyricState;

static LINE_GLOW_SPLINE: Lazy<Spline> = Lazy::new(|| {
    Spline::new(&[
        ControlPoint::new(0.0, 0.0),
        ControlPoint::new(0.5, 1.0),
        ControlPoint::new(1.0, 0.0),
    ])
});

const GLOW_FREQUENCY: f64 = 1.0;
const GLOW_DAMPING: f64 = 0.5;

/// Flat-mode store: a single glow channel. Reduced mode creates none.
#[derive(Debug, Clone)]
pub struct LineSprings {
    pub glow: Option<Spring>,
}

fn create_line_springs(simple: bool) -> LineSprings {
    LineSprings {
        glow: (!simple).then(|| {
            Spring::new(LINE_GLOW_SPLINE.at(0.0), GLOW_FREQUENCY, GLOW_DAMPING)
        }),
    }
}

/// Swap the lifecycle class on a line element to match its state.
pub(crate) fn set_line_state_class(elements: &mut Elements, el: ElementId, state: LyricState) {
    match state {
        LyricState::Active => {
            elements.add_class(el, "Active");
            elements.remove_class(el, "NotSung");
            elements.remove_class(el, "Sung");
        }
        LyricState::NotSung => {
            elements.add_class(el, "NotSung");
            elements.remove_class(el, "Sung");
            elements.remove_class(el, "Active");
        }
        LyricState::Sung => {
            elements.add_class(el, "Sung");
            elements.remove_class(el, "Active");
            elements.remove_class(el, "NotSung");
        }
    }
}

/// Animate a non-dot line in flat mode. Only ever called for the active
/// line; the state parameter keeps the target mapping explicit.
pub(crate) fn animate_flat_line(
    ctx: &mut AnimCtx<'_>,
    line: &mut Line,
    state: LyricState,
    progress: f64,
) {
    let simple = ctx.options.simple_mode;

    let springs = line
        .springs
        .get_or_insert_with(|| create_line_springs(simple));

    let (target_glow, target_gradient) = match state {
        LyricState::Active => (LINE_GLOW_SPLINE.at(progress), progress * 100.0),
        LyricState::NotSung => (LINE_GLOW_SPLINE.at(0.0), -20.0),
        LyricState::Sung => (LINE_GLOW_SPLINE.at(1.0), 100.0),
    };

    let Some(glow) = springs.glow.as_mut() else {
        return;
    };
    glow.set_target(target_glow);
    let current = glow.step(ctx.dt);

    if !simple {
        ctx.elements.set_style(
            line.element,
            "--gradient-position",
            format!("{target_gradient}%"),
        );
        ctx.batch.set_style_if_changed(
            line.element,
            "--text-shadow-blur-radius",
            format!("{}px", 4.0 + 8.0 * current),
            0.5,
        );
        ctx.batch.set_style_if_changed(
            line.element,
            "--text-shadow-opacity",
            format!("{}%", current * 50.0),
            1.0,
        );
    }
}
