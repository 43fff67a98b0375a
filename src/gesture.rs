//! Gesture interpreter.
//!
//! Turns the fingertip and thumb-tip keypoints of one frame into the
//! pinch-to-draw state machine and a cursor position on the canvas.

use tracing::trace;

use crate::types::{CursorSample, HandKeypoints, Keypoint};

/// Fingertip and thumb tip closer than this (canvas pixels) means "pinching".
pub const PINCH_THRESHOLD_PX: f32 = 50.0;

/// Whether the pen is down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GestureState {
    #[default]
    Idle,
    Drawing,
}

/// State change produced by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEdge {
    /// Idle -> Drawing: a stroke begins.
    Started,
    /// Drawing -> Idle: a stroke just completed.
    Stopped,
}

/// Result of interpreting one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureStep {
    pub state: GestureState,
    pub edge: Option<GestureEdge>,
    /// Fingertip on the canvas; `None` when no hand is visible.
    pub cursor: Option<CursorSample>,
    /// Fingertip-to-thumb distance in pixels; infinite without a hand.
    pub pinch_distance: f32,
}

/// Fingertip position on a `width` x `height` canvas, mirrored left/right so
/// the cursor follows the hand as seen in a front-facing camera.
pub fn cursor_position(tip: Keypoint, width: usize, height: usize) -> CursorSample {
    CursorSample::new((1.0 - tip.x) * width as f32, tip.y * height as f32)
}

/// Euclidean distance between two keypoints after scaling x by `width` and y by `height`.
pub fn pinch_distance(tip: Keypoint, thumb: Keypoint, width: usize, height: usize) -> f32 {
    let dx = (tip.x - thumb.x) * width as f32;
    let dy = (tip.y - thumb.y) * height as f32;
    (dx * dx + dy * dy).sqrt()
}

/// Advance the state machine by one frame. `hand == None` counts as an
/// infinitely wide pinch.
pub fn interpret(prev: GestureState, hand: Option<&HandKeypoints>, width: usize, height: usize) -> GestureStep {
    let (cursor, distance) = match hand {
        Some(hand) => (
            Some(cursor_position(hand.fingertip(), width, height)),
            pinch_distance(hand.fingertip(), hand.thumb_tip(), width, height),
        ),
        None => (None, f32::INFINITY),
    };

    let state = if distance < PINCH_THRESHOLD_PX { GestureState::Drawing } else { GestureState::Idle };
    let edge = match (prev, state) {
        (GestureState::Idle, GestureState::Drawing) => Some(GestureEdge::Started),
        (GestureState::Drawing, GestureState::Idle) => Some(GestureEdge::Stopped),
        _ => None,
    };
    trace!(?state, distance, "gesture step");

    GestureStep { state, edge, cursor, pinch_distance: distance }
}
