//! Where finished frames go.

use anyhow::Result;
use std::path::Path;
use std::time::Instant;

use crate::encode::ffmpeg::FfmpegEncoder;
use crate::input::InputEvent;
use crate::render::canvas::Canvas;

pub trait Surface {
    fn present(&mut self, canvas: &Canvas) -> Result<()>;

    /// False once the user closed the surface.
    fn is_open(&self) -> bool {
        true
    }

    /// Input gathered by the surface itself (keyboard, pointer).
    fn input(&mut self, _now: Instant) -> Vec<InputEvent> {
        Vec::new()
    }

    fn finish(self: Box<Self>) -> Result<()>;
}

/// Discards frames, keeping only a count.
#[derive(Default)]
pub struct HeadlessSurface {
    frames: u64,
}

impl Surface for HeadlessSurface {
    fn present(&mut self, _canvas: &Canvas) -> Result<()> {
        self.frames += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        log::info!("Rendered {} frames headless", self.frames);
        Ok(())
    }
}

/// Streams frames into an ffmpeg-encoded video file.
pub struct RecordingSurface {
    encoder: FfmpegEncoder,
}

impl RecordingSurface {
    pub fn new(path: &Path, width: u32, height: u32, fps: u32, codec: &str, crf: u32) -> Result<Self> {
        Ok(Self {
            encoder: FfmpegEncoder::new(path, width, height, fps, codec, crf)?,
        })
    }
}

impl Surface for RecordingSurface {
    fn present(&mut self, canvas: &Canvas) -> Result<()> {
        self.encoder.write_frame(canvas.pixels())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        self.encoder.finish()
    }
}

#[cfg(feature = "window")]
pub use window::WindowSurface;

#[cfg(feature = "window")]
mod window {
    use anyhow::Result;
    use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
    use std::time::Instant;

    use super::Surface;
    use crate::input::{InputEvent, PointerGestures};
    use crate::params::GestureEvent;
    use crate::render::canvas::Canvas;

    const KEYMAP: &[(Key, GestureEvent)] = &[
        (Key::W, GestureEvent::VolumeUp),
        (Key::S, GestureEvent::VolumeDown),
        (Key::E, GestureEvent::BassUp),
        (Key::D, GestureEvent::BassDown),
        (Key::R, GestureEvent::TempoUp),
        (Key::F, GestureEvent::TempoDown),
        (Key::T, GestureEvent::PitchUp),
        (Key::G, GestureEvent::PitchDown),
    ];

    /// Software-presented window. Keys fire gestures; dragging with the left
    /// button held acts as a tracked hand.
    pub struct WindowSurface {
        window: Window,
        buf: Vec<u32>,
        width: usize,
        height: usize,
        pointer: PointerGestures,
    }

    impl WindowSurface {
        pub fn new(title: &str, width: u32, height: u32, fps: u32) -> Result<Self> {
            let (width, height) = (width as usize, height as usize);
            let mut window = Window::new(
                title,
                width,
                height,
                WindowOptions {
                    resize: false,
                    ..WindowOptions::default()
                },
            )
            .map_err(|e| anyhow::anyhow!("Failed to open window: {}", e))?;
            window.set_target_fps(fps as usize);

            Ok(Self {
                window,
                buf: vec![0; width * height],
                width,
                height,
                pointer: PointerGestures::default(),
            })
        }
    }

    impl Surface for WindowSurface {
        fn present(&mut self, canvas: &Canvas) -> Result<()> {
            for (dst, px) in self.buf.iter_mut().zip(canvas.pixels().chunks_exact(4)) {
                *dst = (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32;
            }
            self.window
                .update_with_buffer(&self.buf, self.width, self.height)
                .map_err(|e| anyhow::anyhow!("Window update failed: {}", e))
        }

        fn is_open(&self) -> bool {
            self.window.is_open()
        }

        fn input(&mut self, now: Instant) -> Vec<InputEvent> {
            let mut events = Vec::new();
            let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

            if pressed(Key::Escape) || pressed(Key::Q) {
                events.push(InputEvent::Quit);
            }
            if pressed(Key::C) {
                events.push(InputEvent::ToggleCapture);
            }
            for &(key, gesture) in KEYMAP {
                if pressed(key) {
                    events.push(InputEvent::Gesture(gesture));
                }
            }

            if self.window.get_mouse_down(MouseButton::Left) {
                if let Some((x, y)) = self.window.get_mouse_pos(MouseMode::Discard) {
                    if let Some(g) = self.pointer.observe(x as f64, y as f64, now) {
                        events.push(InputEvent::Gesture(g));
                    }
                }
            }
            events
        }

        fn finish(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }
}
