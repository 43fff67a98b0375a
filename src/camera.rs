// Video sources feeding the hand detector.
// The webcam is opened when gesture input is switched on and released when
// it is switched off; frames come out as 0x00RRGGBB buffers.

use crate::error::Error;
use crate::types::FrameBuffer;

use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
};
use tracing::{debug, info};

/// Something that can hand out the latest video frame.
pub trait VideoSource {
    /// Acquire the device. Fails when e.g. the camera is missing or permission is denied.
    fn start(&mut self) -> Result<(), Error>;
    /// Release the device. Safe to call when already stopped.
    fn stop(&mut self);
    /// Latest frame, or `None` if nothing is ready (or the source is stopped).
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>, Error>;
}

/// Webcam via nokhwa. Holds no device until [`VideoSource::start`].
pub struct CameraCapture {
    index: u32,
    width: u32,
    height: u32,
    cam: Option<Camera>,
}

impl CameraCapture {
    /// Remember which camera to open and the resolution to ask for (falls back if not exact).
    pub fn new(index: u32, width: u32, height: u32) -> Self {
        Self { index, width, height, cam: None }
    }

    fn open(&self) -> Result<Camera, Error> {
        let fmt = CameraFormat::new(
            Resolution::new(self.width, self.height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,                // target FPS
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(CameraIndex::Index(self.index), req)
            .map_err(|e| Error::CameraInit(format!("Create camera: {e}")))?;
        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;
        Ok(cam)
    }

    /// Resolution actually delivered, once streaming.
    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.cam.as_ref().map(|cam| {
            let r = cam.resolution();
            (r.width(), r.height())
        })
    }
}

impl VideoSource for CameraCapture {
    fn start(&mut self) -> Result<(), Error> {
        if self.cam.is_some() {
            return Ok(());
        }
        let cam = self.open()?;
        self.cam = Some(cam);
        if let Some((w, h)) = self.resolution() {
            info!(index = self.index, width = w, height = h, "camera streaming");
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut cam) = self.cam.take() {
            if let Err(e) = cam.stop_stream() {
                debug!(error = %e, "camera stop_stream failed");
            }
            info!(index = self.index, "camera released");
        }
    }

    fn next_frame(&mut self) -> Result<Option<FrameBuffer>, Error> {
        let Some(cam) = self.cam.as_mut() else {
            return Ok(None);
        };
        // Blocks until the driver has a new frame.
        let frame = cam.frame().map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;
        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;

        let (w, h) = rgb_img.dimensions();
        let pixels = rgb_img
            .pixels()
            .map(|p| (p[0] as u32) << 16 | (p[1] as u32) << 8 | p[2] as u32)
            .collect();
        Ok(Some(FrameBuffer { width: w as usize, height: h as usize, pixels }))
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Solid-color frames of a fixed size. Stands in for the camera when keypoints
/// come from a replay file rather than a live detector.
pub struct BlankVideo {
    width: usize,
    height: usize,
    running: bool,
}

impl BlankVideo {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, running: false }
    }
}

impl VideoSource for BlankVideo {
    fn start(&mut self) -> Result<(), Error> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn next_frame(&mut self) -> Result<Option<FrameBuffer>, Error> {
        if !self.running {
            return Ok(None);
        }
        Ok(Some(FrameBuffer::filled(self.width, self.height, 0x00_10_10_10)))
    }
}
