//! Pinch-to-draw: paint on a canvas by pinching thumb and index finger in
//! front of a webcam, with undo/redo.
//!
//! Pipeline per frame: [`camera::VideoSource`] -> [`detector::KeypointSource`]
//! -> [`gesture::interpret`] -> [`stroke::render_segment`] -> [`history::History`]
//! on stroke end. [`session::Session`] owns all of that state and
//! [`driver::RenderLoop`] schedules it once per display refresh.

pub mod camera;
pub mod canvas;
pub mod config;
pub mod detector;
pub mod draw;
pub mod driver;
pub mod error;
pub mod gamma;
pub mod gesture;
pub mod history;
pub mod session;
pub mod stroke;
pub mod types;

pub use canvas::{Canvas, LineCap, Snapshot};
pub use error::Error;
pub use gesture::{GestureState, PINCH_THRESHOLD_PX};
pub use session::{InputSwitch, Session};
pub use types::{BrushConfig, CursorSample, FrameBuffer, HandKeypoints, Keypoint, Rgba};
