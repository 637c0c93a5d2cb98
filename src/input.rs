//! Input sources injected into the demo widget.

use std::collections::VecDeque;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::params::GestureEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Gesture(GestureEvent),
    ToggleCapture,
    Quit,
}

impl FromStr for InputEvent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "capture" => Ok(InputEvent::ToggleCapture),
            "quit" => Ok(InputEvent::Quit),
            other => Ok(InputEvent::Gesture(other.parse()?)),
        }
    }
}

pub trait InputSource {
    /// Everything that happened since the previous poll.
    fn poll(&mut self, now: Instant) -> Vec<InputEvent>;
}

/// Replays events at fixed offsets from the first poll.
///
/// Script syntax: comma-separated `millis:event`, e.g.
/// `500:volume_up,1200:capture,4000:quit`.
pub struct ScriptedInput {
    events: VecDeque<(Duration, InputEvent)>,
    origin: Option<Instant>,
}

impl ScriptedInput {
    pub fn new(mut events: Vec<(Duration, InputEvent)>) -> Self {
        events.sort_by_key(|(at, _)| *at);
        Self {
            events: events.into(),
            origin: None,
        }
    }

    pub fn parse(script: &str) -> anyhow::Result<Self> {
        let mut events = Vec::new();
        for item in script.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (at, event) = item
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("Script entry '{}' is not millis:event", item))?;
            let at: u64 = at
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Bad offset in script entry '{}'", item))?;
            events.push((Duration::from_millis(at), event.trim().parse()?));
        }
        Ok(Self::new(events))
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, now: Instant) -> Vec<InputEvent> {
        let origin = *self.origin.get_or_insert(now);
        let elapsed = now.saturating_duration_since(origin);
        let mut out = Vec::new();
        while let Some(&(at, event)) = self.events.front() {
            if at > elapsed {
                break;
            }
            self.events.pop_front();
            out.push(event);
        }
        out
    }
}

/// Turns pointer motion into gestures, standing in for hand tracking:
/// vertical travel drives volume, horizontal travel drives tempo.
pub struct PointerGestures {
    threshold: f64,
    cooldown: Duration,
    anchor: Option<(f64, f64)>,
    last_fire: Option<Instant>,
}

impl PointerGestures {
    pub fn new(threshold: f64, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            anchor: None,
            last_fire: None,
        }
    }

    pub fn observe(&mut self, x: f64, y: f64, now: Instant) -> Option<GestureEvent> {
        let (ax, ay) = *self.anchor.get_or_insert((x, y));
        let (dx, dy) = (x - ax, y - ay);
        if dx.abs() < self.threshold && dy.abs() < self.threshold {
            return None;
        }
        self.anchor = Some((x, y));
        if let Some(last) = self.last_fire {
            if now.saturating_duration_since(last) < self.cooldown {
                return None;
            }
        }
        self.last_fire = Some(now);
        // Screen y grows downward, so moving up raises volume.
        Some(if dy.abs() >= dx.abs() {
            if dy < 0.0 {
                GestureEvent::VolumeUp
            } else {
                GestureEvent::VolumeDown
            }
        } else if dx > 0.0 {
            GestureEvent::TempoUp
        } else {
            GestureEvent::TempoDown
        })
    }
}

impl Default for PointerGestures {
    fn default() -> Self {
        Self::new(80.0, Duration::from_millis(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_replays_in_order() {
        let mut input = ScriptedInput::parse("1000:quit, 0:volume_up, 500:capture").unwrap();
        let t0 = Instant::now();
        assert_eq!(input.poll(t0), vec![InputEvent::Gesture(GestureEvent::VolumeUp)]);
        assert!(input.poll(t0 + Duration::from_millis(499)).is_empty());
        assert_eq!(
            input.poll(t0 + Duration::from_millis(2000)),
            vec![InputEvent::ToggleCapture, InputEvent::Quit]
        );
        assert!(input.poll(t0 + Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn script_rejects_garbage() {
        assert!(ScriptedInput::parse("soon:quit").is_err());
        assert!(ScriptedInput::parse("100:wave").is_err());
        assert!(ScriptedInput::parse("100").is_err());
        assert!(ScriptedInput::parse("").unwrap().poll(Instant::now()).is_empty());
    }

    #[test]
    fn pointer_motion_maps_to_gestures() {
        let mut p = PointerGestures::new(50.0, Duration::from_millis(100));
        let t0 = Instant::now();
        assert_eq!(p.observe(100.0, 100.0, t0), None);
        assert_eq!(p.observe(110.0, 120.0, t0), None);
        assert_eq!(p.observe(100.0, 30.0, t0), Some(GestureEvent::VolumeUp));
        // Within cooldown: moves the anchor but fires nothing.
        assert_eq!(p.observe(200.0, 30.0, t0 + Duration::from_millis(50)), None);
        assert_eq!(
            p.observe(300.0, 30.0, t0 + Duration::from_millis(200)),
            Some(GestureEvent::TempoUp)
        );
        assert_eq!(
            p.observe(300.0, 130.0, t0 + Duration::from_millis(400)),
            Some(GestureEvent::VolumeDown)
        );
    }
}
