//! Render loop driver.
//!
//! One iteration per display refresh tick: apply queued UI commands, poll the
//! video source and detector if gesture input is on, then present. Each step
//! is awaited before the next begins, so only one frame is ever in flight.

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::camera::VideoSource;
use crate::canvas::Canvas;
use crate::detector::KeypointSource;
use crate::error::Error;
use crate::gesture::GestureState;
use crate::session::{STATUS_WEBCAM_FAILED, STATUS_WEBCAM_OFF, STATUS_WEBCAM_ON, Session};
use crate::types::{BrushConfig, CursorSample, FrameBuffer, Rgba};

/// Requests coming from the UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ToggleInput,
    Clear,
    Undo,
    Redo,
    SetColor(Rgba),
    /// Grow (positive) or shrink (negative) the brush.
    AdjustWidth(f32),
}

/// Everything a frontend needs to draw one frame.
pub struct FrameView<'a> {
    pub canvas: &'a Canvas,
    /// Latest camera frame, if gesture input is on.
    pub backdrop: Option<&'a FrameBuffer>,
    pub cursor: Option<CursorSample>,
    pub drawing: bool,
    pub status: &'a str,
    pub brush: &'a BrushConfig,
}

/// The surrounding UI: a source of commands and a place to show frames.
pub trait Frontend {
    /// The loop runs until this returns false.
    fn is_open(&self) -> bool;
    /// Commands issued since the last call.
    fn poll_commands(&mut self) -> Vec<Command>;
    fn present(&mut self, view: &FrameView<'_>) -> Result<(), Error>;
}

pub struct RenderLoop {
    ticker: Interval,
}

impl RenderLoop {
    /// Tick `fps` times per second. Late ticks are skipped, not bunched up.
    /// Must be called inside a tokio runtime.
    pub fn new(fps: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { ticker }
    }

    /// Drive the session until the frontend closes.
    pub async fn run<V, K, F>(&mut self, session: &mut Session, video: &mut V, detector: &mut K, frontend: &mut F) -> Result<(), Error>
    where
        V: VideoSource,
        K: KeypointSource,
        F: Frontend,
    {
        info!("render loop started");
        while frontend.is_open() {
            self.ticker.tick().await;

            for command in frontend.poll_commands() {
                apply_command(command, session, video).await?;
            }

            let frame = if session.input_active() { grab_frame(video) } else { None };
            if let Some(frame) = &frame {
                if let Err(e) = session.process_frame(detector, frame).await {
                    warn!(error = %e, "frame processing failed");
                }
            }

            let view = FrameView {
                canvas: session.canvas(),
                backdrop: frame.as_ref().filter(|_| session.input_active()),
                cursor: session.cursor(),
                drawing: session.gesture() == GestureState::Drawing,
                status: session.status(),
                brush: session.brush(),
            };
            frontend.present(&view)?;
        }
        video.stop();
        info!("render loop stopped");
        Ok(())
    }
}

/// A failed grab is logged and treated as "no frame ready".
fn grab_frame<V: VideoSource>(video: &mut V) -> Option<FrameBuffer> {
    match video.next_frame() {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "skipping frame");
            None
        }
    }
}

/// Apply one UI command. Undo/redo finish restoring before this returns.
pub async fn apply_command<V: VideoSource>(command: Command, session: &mut Session, video: &mut V) -> Result<(), Error> {
    debug!(?command, "command");
    match command {
        Command::ToggleInput => {
            if session.input_active() {
                session.deactivate_input();
                video.stop();
                session.set_status(STATUS_WEBCAM_OFF);
            } else {
                match video.start() {
                    Ok(()) => {
                        session.activate_input();
                        session.set_status(STATUS_WEBCAM_ON);
                    }
                    Err(e) => {
                        warn!(error = %e, "could not start video input");
                        session.set_status(STATUS_WEBCAM_FAILED);
                    }
                }
            }
        }
        Command::Clear => {
            if let Err(e) = session.clear() {
                warn!(error = %e, "clear failed");
            }
        }
        Command::Undo => match session.undo().await {
            Ok(true) => {}
            Ok(false) => debug!("nothing to undo"),
            Err(e) => warn!(error = %e, "undo failed"),
        },
        Command::Redo => match session.redo().await {
            Ok(true) => {}
            Ok(false) => debug!("nothing to redo"),
            Err(e) => warn!(error = %e, "redo failed"),
        },
        Command::SetColor(color) => {
            session.brush_mut().color = color;
            info!(%color, "brush color");
        }
        Command::AdjustWidth(delta) => {
            let brush = session.brush_mut();
            let width = brush.width + delta;
            brush.set_width(width);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::BlankVideo;
    use crate::history::History;

    struct NoCamera;

    impl VideoSource for NoCamera {
        fn start(&mut self) -> Result<(), Error> {
            Err(Error::CameraInit("permission denied".into()))
        }
        fn stop(&mut self) {}
        fn next_frame(&mut self) -> Result<Option<FrameBuffer>, Error> {
            Ok(None)
        }
    }

    fn session() -> Session {
        Session::new(32, 32, BrushConfig::default(), History::new())
    }

    #[tokio::test]
    async fn toggling_input_starts_and_stops_video() {
        let mut s = session();
        let mut video = BlankVideo::new(8, 8);

        apply_command(Command::ToggleInput, &mut s, &mut video).await.unwrap();
        assert!(s.input_active());
        assert_eq!(s.status(), STATUS_WEBCAM_ON);
        assert!(video.next_frame().unwrap().is_some());

        apply_command(Command::ToggleInput, &mut s, &mut video).await.unwrap();
        assert!(!s.input_active());
        assert_eq!(s.status(), STATUS_WEBCAM_OFF);
        assert!(video.next_frame().unwrap().is_none());
    }

    #[tokio::test]
    async fn unavailable_camera_reports_and_stays_off() {
        let mut s = session();
        apply_command(Command::ToggleInput, &mut s, &mut NoCamera).await.unwrap();
        assert!(!s.input_active());
        assert_eq!(s.status(), STATUS_WEBCAM_FAILED);
    }

    #[tokio::test]
    async fn brush_commands_update_the_brush() {
        let mut s = session();
        let mut video = BlankVideo::new(8, 8);
        let teal = Rgba::opaque(0, 0x80, 0x80);
        apply_command(Command::SetColor(teal), &mut s, &mut video).await.unwrap();
        apply_command(Command::AdjustWidth(4.0), &mut s, &mut video).await.unwrap();
        assert_eq!(s.brush().color, teal);
        assert_eq!(s.brush().width, BrushConfig::default().width + 4.0);

        apply_command(Command::AdjustWidth(-1000.0), &mut s, &mut video).await.unwrap();
        assert_eq!(s.brush().width, BrushConfig::MIN_WIDTH);
    }

    #[tokio::test]
    async fn undo_with_empty_history_is_silent() {
        let mut s = session();
        let mut video = BlankVideo::new(8, 8);
        apply_command(Command::Undo, &mut s, &mut video).await.unwrap();
        apply_command(Command::Redo, &mut s, &mut video).await.unwrap();
        assert!(s.canvas().is_blank());
    }

    #[tokio::test]
    async fn failed_clear_is_logged_not_returned() {
        // A zero-sized surface cannot be encoded, so the pre-clear snapshot fails.
        let mut s = Session::new(0, 0, BrushConfig::default(), History::new());
        let mut video = BlankVideo::new(8, 8);
        apply_command(Command::Clear, &mut s, &mut video).await.unwrap();
        assert_eq!(s.history().undo_depth(), 0);
        assert_ne!(s.status(), crate::session::STATUS_CLEARED);
    }
}
