// The raster surface strokes are painted into.
// Pixels are 0xAARRGGBB with straight alpha; fully transparent means "nothing
// painted here" so the live camera shows through when presenting.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use tracing::debug;

use crate::error::Error;
use crate::gamma::GammaLut;
use crate::types::{CursorSample, FrameBuffer, Rgba};

/// How the ends of a line segment are shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    /// Ends stop flat at the endpoints.
    Butt,
    /// Half-disc of the line width at each end, so consecutive segments join seamlessly.
    Round,
}

/// Encoded copy of the whole surface (PNG). Cloning copies the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: u32,
    height: u32,
    png: Vec<u8>,
}

impl Snapshot {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.png.len()
    }

    pub fn is_empty(&self) -> bool {
        self.png.is_empty()
    }

    /// Bytes that will not decode.
    #[cfg(test)]
    pub(crate) fn corrupt(width: u32, height: u32) -> Self {
        Self { width, height, png: vec![1, 2, 3] }
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.png.len())
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Canvas {
    /// A fully transparent surface.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0; width * height] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Color at (x,y); `None` outside the surface.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(Rgba::from_argb(self.pixels[y * self.width + x]))
    }

    /// True when nothing has been painted (or everything was cleared).
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|px| px >> 24 == 0)
    }

    /// Erase everything back to transparent.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Stroke a straight line from `from` to `to` with anti-aliased edges.
    /// Pixel centers within `width / 2` of the segment are covered; coverage
    /// ramps over one pixel at the border.
    pub fn stroke_line(&mut self, from: CursorSample, to: CursorSample, color: Rgba, width: f32, cap: LineCap) {
        if self.width == 0 || self.height == 0 || color.a == 0 {
            return;
        }
        let half = width.max(1.0) * 0.5;
        let reach = half + 1.0;

        // Bounding box of the capsule, clamped to the surface.
        let x_min = (from.x.min(to.x) - reach).floor().max(0.0) as usize;
        let y_min = (from.y.min(to.y) - reach).floor().max(0.0) as usize;
        let x_max = (from.x.max(to.x) + reach).ceil().min(self.width as f32 - 1.0);
        let y_max = (from.y.max(to.y) + reach).ceil().min(self.height as f32 - 1.0);
        if x_max < 0.0 || y_max < 0.0 {
            return;
        }
        let (x_max, y_max) = (x_max as usize, y_max as usize);

        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let len2 = dx * dx + dy * dy;

        for y in y_min..=y_max {
            for x in x_min..=x_max {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;
                let raw_t = if len2 > 0.0 { ((px - from.x) * dx + (py - from.y) * dy) / len2 } else { 0.0 };
                if cap == LineCap::Butt && len2 > 0.0 && !(0.0..=1.0).contains(&raw_t) {
                    continue;
                }
                let t = raw_t.clamp(0.0, 1.0);
                let cx = from.x + t * dx - px;
                let cy = from.y + t * dy - py;
                let dist = (cx * cx + cy * cy).sqrt();
                let coverage = (half + 0.5 - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_pixel(y * self.width + x, color, coverage);
                }
            }
        }
    }

    /// Source-over blend of `color` at `coverage` into one pixel.
    #[inline]
    fn blend_pixel(&mut self, idx: usize, color: Rgba, coverage: f32) {
        let dst = Rgba::from_argb(self.pixels[idx]);
        let sa = color.a as f32 / 255.0 * coverage;
        let da = dst.a as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return;
        }
        let mix = |s: u8, d: u8| -> u8 {
            let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
            v.round().clamp(0.0, 255.0) as u8
        };
        let out = Rgba::new(
            mix(color.r, dst.r),
            mix(color.g, dst.g),
            mix(color.b, dst.b),
            (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
        );
        self.pixels[idx] = out.to_argb();
    }

    /// Encode the whole surface into a PNG snapshot.
    pub fn encode_snapshot(&self) -> Result<Snapshot, Error> {
        let (w, h) = (self.width as u32, self.height as u32);
        let mut raw = Vec::with_capacity(self.pixels.len() * 4);
        for &px in &self.pixels {
            let c = Rgba::from_argb(px);
            raw.extend_from_slice(&[c.r, c.g, c.b, c.a]);
        }
        let img = RgbaImage::from_raw(w, h, raw)
            .ok_or_else(|| Error::SnapshotEncode("pixel buffer does not match dimensions".into()))?;
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| Error::SnapshotEncode(e.to_string()))?;
        debug!(bytes = png.len(), "encoded canvas snapshot");
        Ok(Snapshot { width: w, height: h, png })
    }

    /// Replace the surface with the contents of `snapshot`.
    /// Decoding runs off the frame loop; the surface is untouched until it finishes.
    /// A snapshot of a different size is drawn at the top-left and clipped.
    pub async fn restore(&mut self, snapshot: &Snapshot) -> Result<(), Error> {
        let png = snapshot.png.clone();
        let img = tokio::task::spawn_blocking(move || {
            image::load_from_memory_with_format(&png, ImageFormat::Png).map(|d| d.to_rgba8())
        })
        .await
        .map_err(|e| Error::SnapshotDecode(e.to_string()))?
        .map_err(|e| Error::SnapshotDecode(e.to_string()))?;

        self.clear();
        let w = (img.width() as usize).min(self.width);
        let h = (img.height() as usize).min(self.height);
        for y in 0..h {
            for x in 0..w {
                let p = img.get_pixel(x as u32, y as u32).0;
                self.pixels[y * self.width + x] = Rgba::new(p[0], p[1], p[2], p[3]).to_argb();
            }
        }
        Ok(())
    }

    /// Composite the painted strokes over `screen` (0x00RRGGBB, same size).
    pub fn composite_onto(&self, screen: &mut FrameBuffer, lut: &GammaLut) -> Result<(), Error> {
        if screen.width != self.width || screen.height != self.height {
            return Err(Error::WindowUpdate("composite: canvas/screen size mismatch".into()));
        }
        for (dst, &src) in screen.pixels.iter_mut().zip(&self.pixels) {
            let a = (src >> 24) as u8;
            if a == 0 {
                continue;
            }
            *dst = lut.mix_rgb(*dst, src, a as f32 / 255.0);
        }
        Ok(())
    }
}
