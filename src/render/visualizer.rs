use clap::ValueEnum;
use serde::Deserialize;

use super::canvas::{Canvas, Rgba};
use super::text::TextOverlay;
use crate::params::{lerp, AudioParameters, Param};

pub const MIN_RADIUS: f64 = 30.0;
pub const MAX_RADIUS: f64 = 100.0;
const OUTLINE_WIDTH: f64 = 5.0;
const PULSE_WIDTH: f64 = 3.0;
const LABEL_OFFSET: f64 = 150.0;
const BAR_COUNT: usize = 64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skin {
    /// One circle per parameter (the reference view)
    #[default]
    Orbs,
    /// Decorative waveform bars
    Bars,
}

/// One parameter's circle for a given frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Orb {
    pub param: Param,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: Rgba,
    /// Outer ring radius offset; only tempo pulses.
    pub pulse: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Per-parameter radius, color and (for tempo) pulse at `time_ms`.
pub fn orb_layout(params: &AudioParameters, time_ms: f64, width: u32, height: u32) -> Vec<Orb> {
    let spacing = width as f64 / 5.0;
    let center_y = height as f64 / 2.0;

    Param::ALL
        .iter()
        .enumerate()
        .map(|(i, &param)| {
            let t = params.normalized(param);
            let color = match param {
                Param::Volume => Rgba::rgb(0.0, lerp(100.0, 255.0, t), 0.0),
                Param::Bass => Rgba::rgb(0.0, 0.0, lerp(100.0, 255.0, t)),
                Param::Tempo => Rgba::rgb(
                    lerp(100.0, 0.0, t),
                    lerp(100.0, 165.0, t),
                    lerp(0.0, 255.0, t),
                ),
                Param::Pitch => Rgba::rgb(lerp(0.0, 255.0, t), 0.0, lerp(255.0, 0.0, t)),
            };
            let pulse = (param == Param::Tempo).then(|| tempo_pulse(params.tempo, time_ms));
            Orb {
                param,
                x: spacing * (i + 1) as f64,
                y: center_y,
                radius: lerp(MIN_RADIUS, MAX_RADIUS, t),
                color,
                pulse,
            }
        })
        .collect()
}

pub fn tempo_pulse(tempo: f64, time_ms: f64) -> f64 {
    5.0 + 10.0 * (time_ms * tempo * 0.01).sin()
}

pub fn labels(params: &AudioParameters, width: u32, height: u32) -> Vec<Label> {
    let spacing = width as f64 / 5.0;
    let y = height as f64 / 2.0 + LABEL_OFFSET;
    Param::ALL
        .iter()
        .enumerate()
        .map(|(i, &param)| Label {
            text: params.label(param),
            x: spacing * (i + 1) as f64,
            y,
        })
        .collect()
}

/// Bar heights (0..=1 of the usable height) for the bars skin.
pub fn bar_heights(params: &AudioParameters, time_ms: f64) -> Vec<f64> {
    let bass_factor = params.bass * 2.0 - 1.0;
    let pitch_factor = params.normalized(Param::Pitch);
    let time = time_ms * 0.001 * params.tempo;

    (0..BAR_COUNT)
        .map(|i| {
            let x = i as f64 / BAR_COUNT as f64;
            let wave1 = (time * 2.0 + x * std::f64::consts::PI * 6.0).sin() * 0.5 + 0.5;
            let wave2 = (time * 3.0 + x * std::f64::consts::PI * 8.0).sin() * 0.5 + 0.5;
            let combined = (wave1 * 0.6 + wave2 * 0.4) * params.volume;
            let bass_boost = (1.0 - x * 2.0).max(0.0) * bass_factor * 0.5;
            let pitch_shift =
                (x * std::f64::consts::PI * 2.0 + pitch_factor * std::f64::consts::PI * 2.0).sin() * 0.2;
            (combined + bass_boost + pitch_shift).clamp(0.0, 1.0)
        })
        .collect()
}

/// Draws the parameter view into a canvas. Holds no animation state: each
/// frame is a pure function of the parameters and the wall-clock time.
pub struct VisualizerRenderer {
    skin: Skin,
    overlay: Option<TextOverlay>,
    background: Rgba,
}

impl VisualizerRenderer {
    pub fn new(skin: Skin, overlay: Option<TextOverlay>) -> Self {
        if overlay.is_none() {
            log::warn!("No font available, parameter labels will not be drawn");
        }
        Self {
            skin,
            overlay,
            background: Rgba([10, 8, 24, 255]),
        }
    }

    pub fn render(&self, canvas: &mut Canvas, params: &AudioParameters, time_ms: f64) -> Vec<Label> {
        canvas.clear(self.background);
        match self.skin {
            Skin::Orbs => self.draw_orbs(canvas, params, time_ms),
            Skin::Bars => self.draw_bars(canvas, params, time_ms),
        }

        let labels = labels(params, canvas.width(), canvas.height());
        if let Some(ref overlay) = self.overlay {
            for label in &labels {
                overlay.composite_centered(
                    canvas,
                    &label.text,
                    label.x,
                    (label.y - overlay.font_size() as f64).round() as i64,
                    Rgba::WHITE,
                );
            }
        }
        labels
    }

    /// Transient inline messages (errors, recognized gestures), top-left.
    pub fn draw_status(&self, canvas: &mut Canvas, lines: &[String]) {
        let Some(ref overlay) = self.overlay else {
            return;
        };
        let line_h = (overlay.font_size() * 1.3).round() as i64;
        for (i, line) in lines.iter().enumerate() {
            overlay.composite(canvas, line, 16, 12 + i as i64 * line_h, Rgba([255, 200, 200, 230]));
        }
    }

    fn draw_orbs(&self, canvas: &mut Canvas, params: &AudioParameters, time_ms: f64) {
        let highlight = Rgba::WHITE.with_alpha(0.2);
        for orb in orb_layout(params, time_ms, canvas.width(), canvas.height()) {
            if let Some(pulse) = orb.pulse {
                canvas.stroke_circle(orb.x, orb.y, orb.radius + pulse, PULSE_WIDTH, orb.color);
            }
            canvas.fill_circle(orb.x, orb.y, orb.radius, orb.color);
            canvas.stroke_circle(orb.x, orb.y, orb.radius, OUTLINE_WIDTH, Rgba::BLACK);
            canvas.fill_circle(orb.x, orb.y - orb.radius * 0.3, orb.radius * 0.7, highlight);
        }
    }

    fn draw_bars(&self, canvas: &mut Canvas, params: &AudioParameters, time_ms: f64) {
        let heights = bar_heights(params, time_ms);
        let bar_w = canvas.width() as f64 / heights.len() as f64;
        let max_h = canvas.height() as f64 * 0.8;
        let top = Rgba::rgb(
            lerp(103.0, 192.0, params.normalized(Param::Pitch)),
            lerp(232.0, 132.0, params.bass),
            lerp(249.0, 180.0, params.normalized(Param::Tempo)),
        )
        .with_alpha(0.8);

        for (i, h) in heights.iter().enumerate() {
            let bar_h = (h * max_h).round() as u32;
            let x = (i as f64 * bar_w).round() as i64;
            let y = canvas.height() as i64 - bar_h as i64;
            canvas.fill_rect(x, y, (bar_w - 1.0).max(1.0) as u32, bar_h, top);
        }
    }
}
