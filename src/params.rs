use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DemoError;

/// Fixed step applied by every gesture, for every field.
pub const GESTURE_STEP: f64 = 0.1;

pub const LEVEL_RANGE: (f64, f64) = (0.0, 1.0);
pub const RATE_RANGE: (f64, f64) = (0.5, 2.0);

/// The four audio controls shared with the backend.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioParameters {
    pub volume: f64,
    pub bass: f64,
    pub tempo: f64,
    pub pitch: f64,
}

impl Default for AudioParameters {
    fn default() -> Self {
        Self {
            volume: 0.5,
            bass: 0.5,
            tempo: 1.0,
            pitch: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    Volume,
    Bass,
    Tempo,
    Pitch,
}

impl Param {
    pub const ALL: [Param; 4] = [Param::Volume, Param::Bass, Param::Tempo, Param::Pitch];

    pub fn range(self) -> (f64, f64) {
        match self {
            Param::Volume | Param::Bass => LEVEL_RANGE,
            Param::Tempo | Param::Pitch => RATE_RANGE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Param::Volume => "Volume",
            Param::Bass => "Bass",
            Param::Tempo => "Tempo",
            Param::Pitch => "Pitch",
        }
    }

    pub fn clamp(self, value: f64) -> f64 {
        let (lo, hi) = self.range();
        value.clamp(lo, hi)
    }
}

impl AudioParameters {
    pub fn get(&self, param: Param) -> f64 {
        match param {
            Param::Volume => self.volume,
            Param::Bass => self.bass,
            Param::Tempo => self.tempo,
            Param::Pitch => self.pitch,
        }
    }

    /// Copy with one field replaced, clamped to that field's bounds.
    pub fn with(mut self, param: Param, value: f64) -> Self {
        let value = param.clamp(value);
        match param {
            Param::Volume => self.volume = value,
            Param::Bass => self.bass = value,
            Param::Tempo => self.tempo = value,
            Param::Pitch => self.pitch = value,
        }
        self
    }

    /// Map a field into 0..1. Volume and bass already live there; tempo and
    /// pitch are rescaled from their 0.5..2.0 domain.
    pub fn normalized(&self, param: Param) -> f64 {
        let (lo, hi) = param.range();
        (self.get(param) - lo) / (hi - lo)
    }

    /// Label text as shown under each orb and on the panel.
    pub fn label(&self, param: Param) -> String {
        match param {
            Param::Volume | Param::Bass => {
                format!("{}: {}%", param.name(), (self.get(param) * 100.0).round() as i64)
            }
            Param::Tempo | Param::Pitch => format!("{}: {:.2}x", param.name(), self.get(param)),
        }
    }

    /// Reject structures with non-finite or out-of-bounds fields. Fields are
    /// never coerced.
    pub fn validate(self) -> Result<Self, DemoError> {
        for param in Param::ALL {
            let value = self.get(param);
            let (lo, hi) = param.range();
            if !value.is_finite() || value < lo || value > hi {
                return Err(DemoError::Decode(format!(
                    "{} out of range: {} not in [{}, {}]",
                    param.name().to_lowercase(),
                    value,
                    lo,
                    hi
                )));
            }
        }
        Ok(self)
    }

    pub fn apply(self, gesture: GestureEvent) -> Self {
        let param = gesture.param();
        self.with(param, self.get(param) + gesture.delta())
    }
}

/// A discrete named request to nudge one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureEvent {
    VolumeUp,
    VolumeDown,
    BassUp,
    BassDown,
    TempoUp,
    TempoDown,
    PitchUp,
    PitchDown,
}

impl GestureEvent {
    pub const ALL: [GestureEvent; 8] = [
        GestureEvent::VolumeUp,
        GestureEvent::VolumeDown,
        GestureEvent::BassUp,
        GestureEvent::BassDown,
        GestureEvent::TempoUp,
        GestureEvent::TempoDown,
        GestureEvent::PitchUp,
        GestureEvent::PitchDown,
    ];

    pub fn param(self) -> Param {
        match self {
            GestureEvent::VolumeUp | GestureEvent::VolumeDown => Param::Volume,
            GestureEvent::BassUp | GestureEvent::BassDown => Param::Bass,
            GestureEvent::TempoUp | GestureEvent::TempoDown => Param::Tempo,
            GestureEvent::PitchUp | GestureEvent::PitchDown => Param::Pitch,
        }
    }

    pub fn delta(self) -> f64 {
        match self {
            GestureEvent::VolumeUp
            | GestureEvent::BassUp
            | GestureEvent::TempoUp
            | GestureEvent::PitchUp => GESTURE_STEP,
            _ => -GESTURE_STEP,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GestureEvent::VolumeUp => "volume_up",
            GestureEvent::VolumeDown => "volume_down",
            GestureEvent::BassUp => "bass_up",
            GestureEvent::BassDown => "bass_down",
            GestureEvent::TempoUp => "tempo_up",
            GestureEvent::TempoDown => "tempo_down",
            GestureEvent::PitchUp => "pitch_up",
            GestureEvent::PitchDown => "pitch_down",
        }
    }

    /// Human-facing button caption, e.g. "Volume Up".
    pub fn caption(self) -> String {
        let dir = if self.delta() > 0.0 { "Up" } else { "Down" };
        format!("{} {}", self.param().name(), dir)
    }
}

impl fmt::Display for GestureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureEvent {
    type Err = DemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GestureEvent::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| DemoError::Decode(format!("unknown gesture '{}'", s)))
    }
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
