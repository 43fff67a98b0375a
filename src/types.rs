// Core value types shared by the camera, the gesture pipeline and the window.

use crate::error::Error;

#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// A frame filled with one 0x00RRGGBB color.
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }

    /// Raw RGB bytes, row-major, 3 bytes per pixel.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for px in &self.pixels {
            out.push(((px >> 16) & 0xFF) as u8);
            out.push(((px >> 8) & 0xFF) as u8);
            out.push((px & 0xFF) as u8);
        }
        out
    }

    /// Nearest-neighbour resample into `dst`, flipping left/right on the way.
    /// Visual: the live camera reads like a mirror, matching the mirrored cursor.
    pub fn blit_mirrored_into(&self, dst: &mut FrameBuffer) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        for y in 0..dst.height {
            let sy = y * self.height / dst.height;
            for x in 0..dst.width {
                let sx = self.width - 1 - (x * self.width / dst.width);
                dst.pixels[y * dst.width + x] = self.pixels[sy * self.width + sx];
            }
        }
    }
}

/// 8-bit straight-alpha color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xFF)
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let hex = s.trim().trim_start_matches('#');
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(Error::InvalidColor(s.to_string()));
        }
        let byte = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| Error::InvalidColor(s.to_string()))
        };
        let a = if hex.len() == 8 { byte(6)? } else { 0xFF };
        Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, a))
    }

    /// Packed as 0xAARRGGBB.
    #[inline]
    pub fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    #[inline]
    pub fn from_argb(px: u32) -> Self {
        Self::new((px >> 16) as u8, (px >> 8) as u8, px as u8, (px >> 24) as u8)
    }

    /// Packed as 0x00RRGGBB, alpha dropped.
    #[inline]
    pub fn to_rgb(self) -> u32 {
        self.to_argb() & 0x00FF_FFFF
    }
}

impl std::fmt::Display for Rgba {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 0xFF {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// Hand landmark indices (MediaPipe hand landmark model convention).
pub mod landmarks {
    pub const COUNT: usize = 21;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_TIP: usize = 8;
}

/// One normalized keypoint: x,y in [0,1] of the camera image, z relative depth.
/// Only meaningful for the frame it came from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Keypoint {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// The 21 keypoints of the (single) tracked hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandKeypoints {
    pub points: [Keypoint; landmarks::COUNT],
}

impl HandKeypoints {
    pub fn new(points: [Keypoint; landmarks::COUNT]) -> Self {
        Self { points }
    }

    /// Build from a slice; `None` unless it holds exactly 21 points.
    pub fn from_slice(points: &[Keypoint]) -> Option<Self> {
        let points: [Keypoint; landmarks::COUNT] = points.try_into().ok()?;
        Some(Self { points })
    }

    /// Index fingertip; this is the pen.
    pub fn fingertip(&self) -> Keypoint {
        self.points[landmarks::INDEX_FINGER_TIP]
    }

    pub fn thumb_tip(&self) -> Keypoint {
        self.points[landmarks::THUMB_TIP]
    }
}

/// Cursor in surface pixel coordinates, recomputed every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorSample {
    pub x: f32,
    pub y: f32,
}

impl CursorSample {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point at parameter `t` on the line from `self` to `to`.
    #[inline]
    pub fn lerp(self, to: CursorSample, t: f32) -> CursorSample {
        CursorSample::new(self.x + t * (to.x - self.x), self.y + t * (to.y - self.y))
    }
}

/// Brush color and width. Read at the moment each segment is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushConfig {
    pub color: Rgba,
    pub width: f32,
}

impl BrushConfig {
    pub const MIN_WIDTH: f32 = 1.0;
    pub const MAX_WIDTH: f32 = 64.0;

    pub fn new(color: Rgba, width: f32) -> Self {
        Self { color, width: width.clamp(Self::MIN_WIDTH, Self::MAX_WIDTH) }
    }

    pub fn set_width(&mut self, width: f32) {
        self.width = width.clamp(Self::MIN_WIDTH, Self::MAX_WIDTH);
    }
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self::new(Rgba::opaque(0xFF, 0x2D, 0x55), 6.0)
    }
}
