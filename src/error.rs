// Crate error type. Every variant states *where* things went wrong.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the window failed
    #[error("Window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed
    #[error("Camera init error: {0}")]
    CameraInit(String), // Opening/starting the camera failed
    #[error("Camera frame error: {0}")]
    CameraFrame(String), // Grabbing/decoding a frame failed
    #[error("Keypoint detector error: {0}")]
    Detector(String), // The landmark process failed or answered garbage
    #[error("Snapshot encode error: {0}")]
    SnapshotEncode(String),
    #[error("Snapshot decode error: {0}")]
    SnapshotDecode(String),
    #[error("Invalid color {0:?}: expected #rrggbb or #rrggbbaa")]
    InvalidColor(String),
    #[error("Replay file error: {0}")]
    Replay(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
