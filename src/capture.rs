//! Camera capture and frame forwarding.
//!
//! `CaptureSimulator` is a two-state machine (inactive / streaming). While
//! streaming, each tick grabs the newest camera frame, shrinks it to a small
//! square snapshot, JPEG-encodes it as a data URL and posts it to the
//! backend. Recognized gesture labels are shown for a couple of seconds.

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::DemoError;
use crate::remote::StateBackend;
use crate::render::canvas::{Canvas, Rgba};
use crate::task::{Dispatcher, Liveness, Timeout};

pub const CAMERA_WIDTH: u32 = 640;
pub const CAMERA_HEIGHT: u32 = 480;
pub const SNAPSHOT_SIZE: u32 = 224;
pub const JPEG_QUALITY: u8 = 80;
pub const LABEL_DURATION: Duration = Duration::from_millis(2000);
pub const ERROR_DURATION: Duration = Duration::from_millis(5000);
const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Grants access to a video stream, or refuses to.
pub trait Camera {
    fn open(&mut self, width: u32, height: u32) -> Result<Box<dyn VideoStream>, DemoError>;
}

/// A live stream. After `stop` every track is released and no frames follow.
pub trait VideoStream {
    fn read_frame(&mut self) -> Option<Canvas>;
    fn stop(&mut self);
    fn is_stopped(&self) -> bool;
}

/// Camera that fabricates frames: a skin-toned blob drifting across a dark
/// room, enough to exercise the whole capture path without hardware.
pub struct SyntheticCamera {
    started: Instant,
}

impl SyntheticCamera {
    pub fn new() -> Self {
        Self { started: Instant::now() }
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera for SyntheticCamera {
    fn open(&mut self, width: u32, height: u32) -> Result<Box<dyn VideoStream>, DemoError> {
        log::info!("Synthetic camera opened at {}x{}", width, height);
        Ok(Box::new(SyntheticStream {
            width,
            height,
            started: self.started,
            stopped: false,
        }))
    }
}

struct SyntheticStream {
    width: u32,
    height: u32,
    started: Instant,
    stopped: bool,
}

impl VideoStream for SyntheticStream {
    fn read_frame(&mut self) -> Option<Canvas> {
        if self.stopped {
            return None;
        }
        let t = self.started.elapsed().as_secs_f64();
        let mut frame = Canvas::new(self.width, self.height);
        frame.clear(Rgba([24, 22, 30, 255]));
        let cx = self.width as f64 * (0.5 + 0.3 * (t * 0.7).sin());
        let cy = self.height as f64 * (0.5 + 0.25 * (t * 1.1).cos());
        frame.fill_circle(cx, cy, self.height as f64 * 0.12, Rgba([224, 172, 105, 255]));
        Some(frame)
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Camera for hosts without one: every open is refused.
pub struct NoCamera;

impl Camera for NoCamera {
    fn open(&mut self, _width: u32, _height: u32) -> Result<Box<dyn VideoStream>, DemoError> {
        Err(DemoError::MediaAccess("no camera available".into()))
    }
}

/// Nearest-neighbour resample of a camera frame into a `size`x`size`
/// offscreen image.
pub fn snapshot(frame: &Canvas, size: u32) -> Result<RgbaImage, DemoError> {
    let source = RgbaImage::from_raw(frame.width(), frame.height(), frame.pixels().to_vec())
        .filter(|img| img.width() > 0 && img.height() > 0)
        .ok_or_else(|| DemoError::Decode("camera frame is empty".into()))?;
    Ok(imageops::resize(&source, size, size, FilterType::Nearest))
}

pub fn encode_jpeg_data_url(snapshot: &RgbaImage, quality: u8) -> Result<String, DemoError> {
    let rgb = DynamicImage::ImageRgba8(snapshot.clone()).into_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode_image(&rgb)
        .map_err(|e| DemoError::Decode(format!("JPEG encoding failed: {}", e)))?;
    Ok(format!(
        "{}{}",
        DATA_URL_PREFIX,
        base64::engine::general_purpose::STANDARD.encode(jpeg)
    ))
}

enum CaptureState {
    Inactive,
    Streaming(Box<dyn VideoStream>),
}

pub struct CaptureSimulator {
    camera: Box<dyn Camera>,
    backend: Arc<dyn StateBackend>,
    state: CaptureState,
    sends: Dispatcher<Result<Vec<String>, DemoError>>,
    recognized: Option<String>,
    label_timer: Timeout,
    error: Option<String>,
    error_timer: Timeout,
    frames_sent: u64,
}

impl CaptureSimulator {
    pub fn new(camera: Box<dyn Camera>, backend: Arc<dyn StateBackend>, liveness: Liveness) -> Self {
        Self {
            camera,
            backend,
            state: CaptureState::Inactive,
            sends: Dispatcher::new(liveness),
            recognized: None,
            label_timer: Timeout::default(),
            error: None,
            error_timer: Timeout::default(),
            frames_sent: 0,
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.state, CaptureState::Streaming(_))
    }

    /// Inactive -> Streaming. A start while already streaming does nothing.
    /// A refusal leaves the simulator inactive with a message that clears
    /// after [`ERROR_DURATION`].
    pub fn start(&mut self, now: Instant) -> Result<(), DemoError> {
        if self.is_streaming() {
            return Ok(());
        }
        match self.camera.open(CAMERA_WIDTH, CAMERA_HEIGHT) {
            Ok(stream) => {
                log::info!("Capture started");
                self.state = CaptureState::Streaming(stream);
                self.error = None;
                Ok(())
            }
            Err(err) => {
                log::warn!("Camera access failed: {}", err);
                self.error = Some(err.to_string());
                self.error_timer.arm(now, ERROR_DURATION);
                Err(err)
            }
        }
    }

    /// Streaming -> Inactive: stops every track and halts the loop. Calling
    /// it again is a no-op.
    pub fn stop(&mut self) {
        if let CaptureState::Streaming(mut stream) =
            std::mem::replace(&mut self.state, CaptureState::Inactive)
        {
            stream.stop();
            self.sends.reset();
            log::info!("Capture stopped after {} frames", self.frames_sent);
        }
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.is_streaming() {
            self.stop();
        } else {
            let _ = self.start(now);
        }
    }

    pub fn tick(&mut self, now: Instant) {
        for reply in self.sends.drain() {
            match reply {
                Ok(labels) => {
                    if let Some(first) = labels.into_iter().next() {
                        log::info!("Recognized gesture: {}", first);
                        self.recognized = Some(first);
                        self.label_timer.arm(now, LABEL_DURATION);
                    }
                }
                Err(err) => log::debug!("Frame send failed: {}", err),
            }
        }
        if self.label_timer.poll_expired(now) {
            self.recognized = None;
        }
        if self.error_timer.poll_expired(now) {
            self.error = None;
        }

        // One frame in flight at a time; skip ticks while the last is pending.
        if self.sends.pending() > 0 {
            return;
        }
        let CaptureState::Streaming(ref mut stream) = self.state else {
            return;
        };
        let Some(frame) = stream.read_frame() else {
            return;
        };
        let data_url = match snapshot(&frame, SNAPSHOT_SIZE)
            .and_then(|snap| encode_jpeg_data_url(&snap, JPEG_QUALITY))
        {
            Ok(url) => url,
            Err(err) => {
                log::debug!("{}", err);
                return;
            }
        };
        let backend = Arc::clone(&self.backend);
        self.sends.spawn(move || backend.send_frame(&data_url));
        self.frames_sent += 1;
    }

    pub fn recognized(&self) -> Option<&str> {
        self.recognized.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    #[cfg(test)]
    fn wait_send(&mut self, now: Instant, timeout: Duration) {
        if let Some(Ok(labels)) = self.sends.wait_one(timeout) {
            if let Some(first) = labels.into_iter().next() {
                self.recognized = Some(first);
                self.label_timer.arm(now, LABEL_DURATION);
            }
        }
    }
}
