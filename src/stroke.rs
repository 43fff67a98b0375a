// Stroke renderer: turns consecutive cursor samples into painted line segments.

use crate::canvas::{Canvas, LineCap};
use crate::types::{BrushConfig, CursorSample};

/// Number of sub-segments each frame-to-frame move is split into.
/// Smooths jitter between frames at high frame rates.
pub const SMOOTHING_STEPS: usize = 10;

/// Extend the current stroke to `current`.
///
/// With no `last` position (first sample of a stroke) nothing is painted.
/// Otherwise the move `last -> current` is drawn as [`SMOOTHING_STEPS`]
/// consecutive round-capped sub-segments using the brush as it is right now.
/// Returns whether anything was painted; the caller keeps `current` as the
/// next `last`.
pub fn render_segment(
    canvas: &mut Canvas,
    brush: &BrushConfig,
    last: Option<CursorSample>,
    current: CursorSample,
) -> bool {
    let Some(last) = last else {
        return false;
    };

    let mut prev = last;
    for i in 1..=SMOOTHING_STEPS {
        let t = i as f32 / SMOOTHING_STEPS as f32;
        let next = last.lerp(current, t);
        canvas.stroke_line(prev, next, brush.color, brush.width, LineCap::Round);
        prev = next;
    }
    true
}
