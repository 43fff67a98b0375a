// Command-line configuration.

use std::path::PathBuf;

use clap::Parser;
use clap::builder::RangedU64ValueParser;

use crate::error::Error;
use crate::history::History;
use crate::types::{BrushConfig, Rgba};

/// Largest accepted canvas side.
const MAX_SIDE: u64 = 8192;

#[derive(Parser, Debug, Clone)]
#[command(name = "pinch-paint", about = "Draw in the air: pinch thumb and index finger in front of the webcam to paint")]
pub struct Config {
    /// Canvas/window width in pixels
    #[arg(long, default_value_t = 640, value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_SIDE))]
    pub width: usize,

    /// Canvas/window height in pixels
    #[arg(long, default_value_t = 480, value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_SIDE))]
    pub height: usize,

    /// Camera device index (0 = default webcam)
    #[arg(long, default_value_t = 0)]
    pub camera_index: u32,

    /// Frame polls per second
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub fps: u32,

    /// Initial brush color (#rrggbb or #rrggbbaa)
    #[arg(long, default_value = "#ff2d55")]
    pub color: String,

    /// Initial brush width in pixels
    #[arg(long, default_value_t = 6.0)]
    pub brush_width: f32,

    /// Keep at most this many undo steps (default: unbounded)
    #[arg(long)]
    pub history_limit: Option<usize>,

    /// Hand-landmark process to run; it receives raw frames on stdin and
    /// answers one JSON line per frame
    #[arg(long, default_value = "python3 hand_detect.py")]
    pub detector_cmd: String,

    /// Replay recorded keypoints (JSON lines) instead of using the camera and detector
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Turn gesture input on at startup
    #[arg(long)]
    pub autostart: bool,
}

impl Config {
    pub fn brush(&self) -> Result<BrushConfig, Error> {
        Ok(BrushConfig::new(Rgba::from_hex(&self.color)?, self.brush_width))
    }

    pub fn history(&self) -> History {
        History::with_limit(self.history_limit)
    }
}
