//! The drawing session: every piece of mutable pipeline state in one place.
//!
//! Frames, UI commands and history restores all go through `&mut Session`,
//! so a restore can never interleave with a stroke.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::canvas::Canvas;
use crate::detector::KeypointSource;
use crate::error::Error;
use crate::gesture::{self, GestureEdge, GestureState};
use crate::history::History;
use crate::stroke;
use crate::types::{BrushConfig, CursorSample, FrameBuffer, HandKeypoints};

pub const STATUS_READY: &str = "Turn on the webcam to start.";
pub const STATUS_DRAWING: &str = "Drawing in progress!";
pub const STATUS_PINCH: &str = "Pinch to start drawing!";
pub const STATUS_CLEARED: &str = "Canvas cleared!";
pub const STATUS_WEBCAM_ON: &str = "Webcam on. Pinch to start drawing!";
pub const STATUS_WEBCAM_OFF: &str = "Webcam turned off.";
pub const STATUS_WEBCAM_FAILED: &str = "Failed to access webcam.";

/// Shared on/off flag for gesture input.
///
/// Clones observe the same flag, so whoever toggles input (a key handler, a
/// detector callback, a test) is seen by the frame loop on its next check.
#[derive(Debug, Clone, Default)]
pub struct InputSwitch(Arc<AtomicBool>);

impl InputSwitch {
    pub fn new(active: bool) -> Self {
        Self(Arc::new(AtomicBool::new(active)))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, active: bool) {
        self.0.store(active, Ordering::SeqCst);
    }
}

/// What happened to one polled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Input was off before detection started.
    Skipped,
    /// Input was switched off while detection was in flight; result dropped.
    Discarded,
    /// Detection result was applied.
    Applied { drew: bool, snapshot: bool },
}

pub struct Session {
    canvas: Canvas,
    brush: BrushConfig,
    history: History,
    gesture: GestureState,
    last_position: Option<CursorSample>,
    cursor: Option<CursorSample>,
    status: String,
    input: InputSwitch,
}

impl Session {
    pub fn new(width: usize, height: usize, brush: BrushConfig, history: History) -> Self {
        Self {
            canvas: Canvas::new(width, height),
            brush,
            history,
            gesture: GestureState::Idle,
            last_position: None,
            cursor: None,
            status: STATUS_READY.to_string(),
            input: InputSwitch::default(),
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn brush(&self) -> &BrushConfig {
        &self.brush
    }

    /// Brush edits apply from the next segment on.
    pub fn brush_mut(&mut self) -> &mut BrushConfig {
        &mut self.brush
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn gesture(&self) -> GestureState {
        self.gesture
    }

    /// Last fingertip position seen, for the on-screen indicator.
    pub fn cursor(&self) -> Option<CursorSample> {
        self.cursor
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        let status = status.into();
        if status != self.status {
            info!(status = %status, "status");
            self.status = status;
        }
    }

    /// Handle to the gesture-input flag.
    pub fn input(&self) -> InputSwitch {
        self.input.clone()
    }

    pub fn input_active(&self) -> bool {
        self.input.is_active()
    }

    /// Turn gesture input on. Any half-finished stroke from a previous run is
    /// forgotten (no snapshot) so the next pinch starts fresh.
    pub fn activate_input(&mut self) {
        self.gesture = GestureState::Idle;
        self.last_position = None;
        self.cursor = None;
        self.input.set(true);
    }

    /// Turn gesture input off. Takes effect at the next flag check, including
    /// one right after an in-flight detection.
    /// The gesture drops back to idle without a snapshot.
    pub fn deactivate_input(&mut self) {
        self.input.set(false);
        self.gesture = GestureState::Idle;
        self.last_position = None;
        self.cursor = None;
    }

    /// Detect on `frame` and run the result through the pipeline.
    pub async fn process_frame<K: KeypointSource>(&mut self, detector: &mut K, frame: &FrameBuffer) -> Result<FrameOutcome, Error> {
        if !self.input.is_active() {
            return Ok(FrameOutcome::Skipped);
        }
        let hand = match detector.detect(frame).await {
            Ok(hand) => hand,
            Err(e) => {
                warn!(error = %e, "detection failed, treating as no hand");
                None
            }
        };
        // Re-read the flag: it may have flipped while we were suspended.
        if !self.input.is_active() {
            debug!("input switched off during detection; dropping result");
            return Ok(FrameOutcome::Discarded);
        }
        self.apply_keypoints(hand.as_ref())
    }

    /// Interpret one frame's keypoints: update the gesture state, draw, and
    /// snapshot when a stroke ends.
    pub fn apply_keypoints(&mut self, hand: Option<&HandKeypoints>) -> Result<FrameOutcome, Error> {
        let step = gesture::interpret(self.gesture, hand, self.canvas.width(), self.canvas.height());
        self.gesture = step.state;
        self.cursor = step.cursor;

        let mut snapshot = Ok(());
        match step.edge {
            Some(GestureEdge::Started) => self.set_status(STATUS_DRAWING),
            Some(GestureEdge::Stopped) => {
                snapshot = self.history.snapshot(&self.canvas);
                self.set_status(STATUS_PINCH);
            }
            None => {}
        }

        let mut drew = false;
        match (step.state, step.cursor) {
            (GestureState::Drawing, Some(cursor)) => {
                drew = stroke::render_segment(&mut self.canvas, &self.brush, self.last_position, cursor);
                if drew {
                    self.history.discard_redo();
                }
                self.last_position = Some(cursor);
            }
            _ => self.last_position = None,
        }

        // Position bookkeeping above must happen even when the snapshot failed.
        let snapshot = snapshot.map(|()| step.edge == Some(GestureEdge::Stopped))?;
        Ok(FrameOutcome::Applied { drew, snapshot })
    }

    /// Snapshot, then wipe the canvas.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.history.clear(&mut self.canvas)?;
        self.set_status(STATUS_CLEARED);
        Ok(())
    }

    /// Returns whether anything was undone.
    pub async fn undo(&mut self) -> Result<bool, Error> {
        self.history.undo(&mut self.canvas).await
    }

    /// Returns whether anything was redone.
    pub async fn redo(&mut self) -> Result<bool, Error> {
        self.history.redo(&mut self.canvas).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Keypoint, Rgba, landmarks};

    /// Hand with the fingertip at (x, y) and the thumb `gap` to its right (normalized).
    fn hand_at(x: f32, y: f32, gap: f32) -> HandKeypoints {
        let mut pts = [Keypoint::default(); 21];
        pts[landmarks::INDEX_FINGER_TIP] = Keypoint::new(x, y, 0.0);
        pts[landmarks::THUMB_TIP] = Keypoint::new(x + gap, y, 0.0);
        HandKeypoints::new(pts)
    }

    fn session() -> Session {
        let mut s = Session::new(200, 100, BrushConfig::new(Rgba::opaque(0, 0, 0), 4.0), History::new());
        s.activate_input();
        s
    }

    /// Flips the input switch off while "detecting", then reports a pinch.
    struct SwitchOffMidDetect {
        input: InputSwitch,
        hand: HandKeypoints,
    }

    impl KeypointSource for SwitchOffMidDetect {
        async fn detect(&mut self, _frame: &FrameBuffer) -> Result<Option<HandKeypoints>, Error> {
            tokio::task::yield_now().await;
            self.input.set(false);
            Ok(Some(self.hand.clone()))
        }
    }

    struct Failing;

    impl KeypointSource for Failing {
        async fn detect(&mut self, _frame: &FrameBuffer) -> Result<Option<HandKeypoints>, Error> {
            Err(Error::Detector("boom".into()))
        }
    }

    #[test]
    fn open_hand_never_draws() {
        let mut s = session();
        for x in [0.2, 0.4, 0.6] {
            let out = s.apply_keypoints(Some(&hand_at(x, 0.5, 0.3))).unwrap();
            assert_eq!(out, FrameOutcome::Applied { drew: false, snapshot: false });
            assert_eq!(s.gesture(), GestureState::Idle);
        }
        assert!(s.canvas().is_blank());
    }

    #[test]
    fn first_pinch_frame_only_records_position() {
        let mut s = session();
        let out = s.apply_keypoints(Some(&hand_at(0.8, 0.5, 0.01))).unwrap();
        assert_eq!(out, FrameOutcome::Applied { drew: false, snapshot: false });
        assert_eq!(s.gesture(), GestureState::Drawing);
        assert_eq!(s.status(), STATUS_DRAWING);
        assert!(s.canvas().is_blank());

        let out = s.apply_keypoints(Some(&hand_at(0.5, 0.5, 0.01))).unwrap();
        assert_eq!(out, FrameOutcome::Applied { drew: true, snapshot: false });
        // Mirrored: x 0.8 -> 40 px, x 0.5 -> 100 px.
        assert_eq!(s.canvas().pixel(70, 50), Some(Rgba::opaque(0, 0, 0)));
    }

    #[test]
    fn releasing_snapshots_and_resets_position() {
        let mut s = session();
        s.apply_keypoints(Some(&hand_at(0.8, 0.5, 0.01))).unwrap();
        s.apply_keypoints(Some(&hand_at(0.6, 0.5, 0.01))).unwrap();
        let out = s.apply_keypoints(Some(&hand_at(0.6, 0.5, 0.4))).unwrap();
        assert_eq!(out, FrameOutcome::Applied { drew: false, snapshot: true });
        assert_eq!(s.history().undo_depth(), 1);
        assert_eq!(s.status(), STATUS_PINCH);

        // New stroke far away: no line back to the old position.
        s.apply_keypoints(Some(&hand_at(0.2, 0.1, 0.01))).unwrap();
        assert_eq!(s.canvas().pixel(120, 30), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn losing_the_hand_ends_the_stroke() {
        let mut s = session();
        s.apply_keypoints(Some(&hand_at(0.8, 0.5, 0.01))).unwrap();
        let out = s.apply_keypoints(None).unwrap();
        assert_eq!(out, FrameOutcome::Applied { drew: false, snapshot: true });
        assert_eq!(s.gesture(), GestureState::Idle);
        assert_eq!(s.cursor(), None);
    }

    #[tokio::test]
    async fn detection_resolving_after_switch_off_is_discarded() {
        let mut s = session();
        let frame = FrameBuffer::filled(4, 4, 0);
        s.apply_keypoints(Some(&hand_at(0.8, 0.5, 0.01))).unwrap();

        let mut detector = SwitchOffMidDetect { input: s.input(), hand: hand_at(0.2, 0.5, 0.01) };
        let out = s.process_frame(&mut detector, &frame).await.unwrap();
        assert_eq!(out, FrameOutcome::Discarded);
        assert!(s.canvas().is_blank());
        assert_eq!(s.history().undo_depth(), 0);

        let out = s.process_frame(&mut detector, &frame).await.unwrap();
        assert_eq!(out, FrameOutcome::Skipped);
    }

    #[tokio::test]
    async fn detector_failure_counts_as_no_hand() {
        let mut s = session();
        s.apply_keypoints(Some(&hand_at(0.8, 0.5, 0.01))).unwrap();
        let out = s.process_frame(&mut Failing, &FrameBuffer::filled(2, 2, 0)).await.unwrap();
        assert_eq!(out, FrameOutcome::Applied { drew: false, snapshot: true });
    }

    #[test]
    fn deactivating_mid_stroke_returns_to_idle() {
        let mut s = session();
        s.apply_keypoints(Some(&hand_at(0.8, 0.5, 0.01))).unwrap();
        s.apply_keypoints(Some(&hand_at(0.6, 0.5, 0.01))).unwrap();
        assert_eq!(s.gesture(), GestureState::Drawing);

        s.deactivate_input();
        assert_eq!(s.gesture(), GestureState::Idle);
        assert_eq!(s.cursor(), None);
        assert_eq!(s.history().undo_depth(), 0);
    }

    #[test]
    fn failed_release_snapshot_still_lifts_the_pen() {
        let mut s = Session::new(0, 0, BrushConfig::default(), History::new());
        s.activate_input();
        s.apply_keypoints(Some(&hand_at(0.5, 0.5, 0.0))).unwrap();
        assert!(matches!(s.apply_keypoints(None), Err(Error::SnapshotEncode(_))));
        assert_eq!(s.gesture(), GestureState::Idle);
        assert_eq!(s.last_position, None);
    }

    #[tokio::test]
    async fn drawing_after_undo_discards_redo() {
        let mut s = session();
        // draw
        s.apply_keypoints(Some(&hand_at(0.9, 0.5, 0.01))).unwrap();
        s.apply_keypoints(Some(&hand_at(0.7, 0.5, 0.01))).unwrap();
        s.apply_keypoints(None).unwrap();
        // undo
        assert!(s.undo().await.unwrap());
        assert!(s.history().can_redo());
        // draw
        s.apply_keypoints(Some(&hand_at(0.3, 0.2, 0.01))).unwrap();
        s.apply_keypoints(Some(&hand_at(0.1, 0.2, 0.01))).unwrap();
        assert!(!s.history().can_redo());
        s.apply_keypoints(None).unwrap();
        let after = s.canvas().clone();
        // redo
        assert!(!s.redo().await.unwrap());
        assert!(*s.canvas() == after);
    }

    #[test]
    fn reactivation_forgets_the_open_stroke() {
        let mut s = session();
        s.apply_keypoints(Some(&hand_at(0.8, 0.5, 0.01))).unwrap();
        s.deactivate_input();
        s.activate_input();
        assert_eq!(s.gesture(), GestureState::Idle);
        let out = s.apply_keypoints(Some(&hand_at(0.2, 0.5, 0.01))).unwrap();
        assert_eq!(out, FrameOutcome::Applied { drew: false, snapshot: false });
        assert_eq!(s.history().undo_depth(), 0);
    }

    #[test]
    fn clear_reports_status_and_is_recorded() {
        let mut s = session();
        s.clear().unwrap();
        assert_eq!(s.status(), STATUS_CLEARED);
        assert_eq!(s.history().undo_depth(), 1);
    }
}
