//! Headless runs of the full render loop: blank video, replayed keypoints,
//! scripted UI commands.

use std::collections::VecDeque;

use pinch_paint::camera::BlankVideo;
use pinch_paint::detector::{KeypointSource, ReplayDetector};
use pinch_paint::driver::{Command, FrameView, Frontend, RenderLoop};
use pinch_paint::history::History;
use pinch_paint::session::{STATUS_PINCH, STATUS_WEBCAM_OFF};
use pinch_paint::types::landmarks;
use pinch_paint::{BrushConfig, Error, FrameBuffer, HandKeypoints, InputSwitch, Keypoint, Rgba, Session};

const W: usize = 200;
const H: usize = 100;

fn pinch_at(x: f32, y: f32) -> Option<HandKeypoints> {
    hand(x, y, 0.01)
}

fn open_at(x: f32, y: f32) -> Option<HandKeypoints> {
    hand(x, y, 0.6)
}

fn hand(x: f32, y: f32, gap: f32) -> Option<HandKeypoints> {
    let mut pts = [Keypoint::default(); 21];
    pts[landmarks::INDEX_FINGER_TIP] = Keypoint::new(x, y, 0.0);
    pts[landmarks::THUMB_TIP] = Keypoint::new(x, y + gap, 0.0);
    Some(HandKeypoints::new(pts))
}

#[derive(Debug, Clone)]
struct Presented {
    drawing: bool,
    backdrop: bool,
    blank: bool,
    status: String,
}

/// Issues one batch of commands per frame and closes after `frames` presents.
struct ScriptedFrontend {
    frames: usize,
    script: VecDeque<Vec<Command>>,
    presented: Vec<Presented>,
}

impl ScriptedFrontend {
    fn new(frames: usize, script: Vec<Vec<Command>>) -> Self {
        Self { frames, script: script.into(), presented: Vec::new() }
    }
}

impl Frontend for ScriptedFrontend {
    fn is_open(&self) -> bool {
        self.presented.len() < self.frames
    }

    fn poll_commands(&mut self) -> Vec<Command> {
        self.script.pop_front().unwrap_or_default()
    }

    fn present(&mut self, view: &FrameView<'_>) -> Result<(), Error> {
        self.presented.push(Presented {
            drawing: view.drawing,
            backdrop: view.backdrop.is_some(),
            blank: view.canvas.is_blank(),
            status: view.status.to_string(),
        });
        Ok(())
    }
}

fn session() -> Session {
    Session::new(W, H, BrushConfig::new(Rgba::opaque(0x10, 0x20, 0xF0), 4.0), History::new())
}

#[tokio::test]
async fn pinch_stroke_is_drawn_recorded_and_undoable() {
    let mut session = session();
    let mut video = BlankVideo::new(64, 48);
    let mut detector = ReplayDetector::new([
        open_at(0.9, 0.5),
        pinch_at(0.9, 0.5),
        pinch_at(0.7, 0.5),
        pinch_at(0.5, 0.5),
        open_at(0.5, 0.5),
    ]);
    let mut frontend = ScriptedFrontend::new(
        7,
        vec![
            vec![Command::ToggleInput],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![Command::Undo],
        ],
    );

    RenderLoop::new(1000).run(&mut session, &mut video, &mut detector, &mut frontend).await.unwrap();

    let p = &frontend.presented;
    assert!(p.iter().all(|f| f.backdrop));
    assert_eq!(p.iter().map(|f| f.drawing).collect::<Vec<_>>(), [false, true, true, true, false, false, false]);
    // Frame 1 only records the position; frames 2 and 3 paint.
    assert!(p[1].blank);
    assert!(!p[2].blank);
    assert_eq!(p[4].status, STATUS_PINCH);

    // Stroke from x=20 to x=100 at y=50 in canvas pixels.
    assert_eq!(session.canvas().pixel(60, 50), Some(Rgba::opaque(0x10, 0x20, 0xF0)));
    // The undo restored the snapshot taken at release (the finished stroke).
    assert_eq!(session.history().undo_depth(), 0);
    assert_eq!(session.history().redo_depth(), 1);
    assert!(!session.canvas().is_blank());
}

#[tokio::test]
async fn clear_then_undo_brings_the_drawing_back() {
    let mut session = session();
    let mut video = BlankVideo::new(8, 8);
    let mut detector = ReplayDetector::new([pinch_at(0.8, 0.2), pinch_at(0.6, 0.2), None]);
    let mut frontend = ScriptedFrontend::new(
        6,
        vec![vec![Command::ToggleInput], vec![], vec![], vec![Command::Clear], vec![Command::Undo]],
    );

    RenderLoop::new(1000).run(&mut session, &mut video, &mut detector, &mut frontend).await.unwrap();

    let p = &frontend.presented;
    assert!(!p[2].blank);
    assert!(p[3].blank);
    assert!(!p[4].blank);
}

#[tokio::test]
async fn nothing_is_polled_while_input_is_off() {
    let mut session = session();
    let mut video = BlankVideo::new(8, 8);
    let mut detector = ReplayDetector::new([pinch_at(0.8, 0.2), pinch_at(0.6, 0.2)]);
    let mut frontend = ScriptedFrontend::new(4, vec![]);

    RenderLoop::new(1000).run(&mut session, &mut video, &mut detector, &mut frontend).await.unwrap();

    assert!(frontend.presented.iter().all(|f| !f.backdrop && !f.drawing && f.blank));
    // Replay untouched: no frame was ever handed to the detector.
    assert_eq!(detector.remaining(), 2);
}

/// Reports a pinch but switches input off before returning, like a user
/// hitting the toggle while a detection is still running.
struct SlowDetector {
    input: InputSwitch,
    calls: usize,
}

impl KeypointSource for SlowDetector {
    async fn detect(&mut self, _frame: &FrameBuffer) -> Result<Option<HandKeypoints>, Error> {
        self.calls += 1;
        tokio::task::yield_now().await;
        if self.calls == 3 {
            self.input.set(false);
        }
        Ok(pinch_at(0.9 - 0.1 * self.calls as f32, 0.5))
    }
}

#[tokio::test]
async fn switching_off_mid_detection_stops_all_drawing() {
    let mut session = session();
    let mut video = BlankVideo::new(8, 8);
    let mut detector = SlowDetector { input: session.input(), calls: 0 };
    let mut frontend = ScriptedFrontend::new(6, vec![vec![Command::ToggleInput]]);

    RenderLoop::new(1000).run(&mut session, &mut video, &mut detector, &mut frontend).await.unwrap();

    // Two frames applied (one records, one paints); the third is discarded.
    assert_eq!(detector.calls, 3);
    let painted = session.canvas().clone();
    assert!(!painted.is_blank());
    // Painted 40 -> 60; the discarded frame would have continued to x = 80.
    assert_eq!(painted.pixel(50, 50), Some(Rgba::opaque(0x10, 0x20, 0xF0)));
    assert_eq!(painted.pixel(75, 50), Some(Rgba::TRANSPARENT));
    assert_eq!(session.history().undo_depth(), 0);
    assert!(frontend.presented[3..].iter().all(|f| !f.backdrop));
}

#[tokio::test]
async fn webcam_toggle_off_reports_status() {
    let mut session = session();
    let mut video = BlankVideo::new(8, 8);
    let mut detector = ReplayDetector::default();
    let mut frontend = ScriptedFrontend::new(3, vec![vec![Command::ToggleInput], vec![Command::ToggleInput]]);

    RenderLoop::new(1000).run(&mut session, &mut video, &mut detector, &mut frontend).await.unwrap();

    assert_eq!(frontend.presented[1].status, STATUS_WEBCAM_OFF);
    assert!(!session.input_active());
}

#[tokio::test]
async fn failed_snapshot_does_not_stop_the_loop() {
    // Nothing can be encoded from a zero-sized canvas, so the release snapshot errors.
    let mut session = Session::new(0, 0, BrushConfig::default(), History::new());
    let mut video = BlankVideo::new(8, 8);
    let mut detector = ReplayDetector::new([pinch_at(0.5, 0.5), None]);
    let mut frontend = ScriptedFrontend::new(4, vec![vec![Command::ToggleInput], vec![], vec![Command::Clear]]);

    let result = RenderLoop::new(1000).run(&mut session, &mut video, &mut detector, &mut frontend).await;

    assert!(result.is_ok());
    assert_eq!(frontend.presented.len(), 4);
    assert_eq!(detector.remaining(), 0);
    assert_eq!(session.history().undo_depth(), 0);
}

#[tokio::test]
async fn switching_off_mid_stroke_lifts_the_pen() {
    let mut session = session();
    let mut video = BlankVideo::new(8, 8);
    let mut detector = ReplayDetector::new([pinch_at(0.8, 0.5), pinch_at(0.6, 0.5)]);
    let mut frontend =
        ScriptedFrontend::new(4, vec![vec![Command::ToggleInput], vec![], vec![Command::ToggleInput]]);

    RenderLoop::new(1000).run(&mut session, &mut video, &mut detector, &mut frontend).await.unwrap();

    let p = &frontend.presented;
    assert!(p[1].drawing);
    assert!(p[2..].iter().all(|f| !f.drawing && !f.backdrop));
    // Lifted without a release snapshot.
    assert_eq!(session.history().undo_depth(), 0);
}
