//! Glow channel output
//!
//! A glow intensity in `0..1` maps to a text-shadow blur radius and opacity.
//! Each entity kind has its own multipliers so a dot blooms wider than a
//! word and a letter wider still.

use crate::element::ElementId;
use crate::engine::style_batch::StyleBatch;

pub const GLOW_BLUR_BASE: f64 = 4.0;

pub const WORD_BLUR_MULT: f64 = 2.0;
pub const DOT_BLUR_MULT: f64 = 6.0;
pub const LETTER_BLUR_MULT: f64 = 12.0;
pub const LINE_BLUR_MULT: f64 = 8.0;

pub const WORD_OPACITY_MULT: f64 = 35.0;
pub const WORD_OPACITY_MAX: f64 = 100.0;
pub const DOT_OPACITY_MULT: f64 = 90.0;
pub const LETTER_OPACITY_MULT: f64 = 185.0;
pub const LINE_OPACITY_MULT: f64 = 50.0;

/// Write the glow channels for an element through the change-detected path.
pub(crate) fn apply_glow_style(
    batch: &mut StyleBatch,
    el: ElementId,
    glow: f64,
    blur_mult: f64,
    opacity_mult: f64,
    opacity_max: f64,
) {
    let blur = format!("{}px", GLOW_BLUR_BASE + blur_mult * glow);
    let opacity = format!("{}%", (glow * opacity_mult).min(opacity_max));
    batch.set_style_if_changed(el, "--text-shadow-blur-radius", blur, 0.5);
    batch.set_style_if_changed(el, "--text-shadow-opacity", opacity, 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Elements;

    #[test]
    fn glow_maps_to_blur_and_opacity() {
        let mut elements = Elements::new();
        let el = elements.create();
        let mut batch = StyleBatch::new();

        apply_glow_style(&mut batch, el, 1.0, WORD_BLUR_MULT, WORD_OPACITY_MULT, WORD_OPACITY_MAX);
        batch.flush(&mut elements);

        assert_eq!(elements.style(el, "--text-shadow-blur-radius"), Some("6px"));
        assert_eq!(elements.style(el, "--text-shadow-opacity"), Some("35%"));
    }

    #[test]
    fn opacity_is_capped() {
        let mut elements = Elements::new();
        let el = elements.create();
        let mut batch = StyleBatch::new();

        apply_glow_style(&mut batch, el, 1.0, LETTER_BLUR_MULT, LETTER_OPACITY_MULT, 100.0);
        batch.flush(&mut elements);
        assert_eq!(elements.style(el, "--text-shadow-opacity"), Some("100%"));
    }

    #[test]
    fn sub_epsilon_glow_wobble_is_dropped() {
        let mut elements = Elements::new();
        let el = elements.create();
        let mut batch = StyleBatch::new();

        apply_glow_style(&mut batch, el, 0.5, WORD_BLUR_MULT, WORD_OPACITY_MULT, WORD_OPACITY_MAX);
        batch.flush(&mut elements);
        let writes = elements.committed_writes();

        // 0.5 → 0.51 moves blur by 0.02px and opacity by 0.35%: both inside
        // their epsilons.
        apply_glow_style(&mut batch, el, 0.51, WORD_BLUR_MULT, WORD_OPACITY_MULT, WORD_OPACITY_MAX);
        batch.flush(&mut elements);
        assert_eq!(elements.committed_writes(), writes);
    }
}
