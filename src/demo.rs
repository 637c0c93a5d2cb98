use clap::ValueEnum;
use serde::Deserialize;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::capture::{Camera, CaptureSimulator};
use crate::error::DemoError;
use crate::input::InputEvent;
use crate::panel::GestureDispatchPanel;
use crate::params::AudioParameters;
use crate::remote::StateBackend;
use crate::render::canvas::Canvas;
use crate::render::visualizer::{Label, VisualizerRenderer};
use crate::store::{ParameterStore, SubscriberId};
use crate::task::{Dispatcher, Interval, Liveness};

/// Where the widget's authoritative state lives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// In-process stand-in backend with random gesture recognition
    #[default]
    Simulated,
    /// The external HTTP backend
    Remote,
}

/// What one frame produced, for presentation and logging.
#[derive(Debug)]
pub struct FrameReport {
    pub params: AudioParameters,
    pub labels: Vec<Label>,
    pub status: Vec<String>,
}

/// The interactive demo: state poll, visualizer, gesture panel and capture
/// sharing one parameter store. Everything it starts is torn down with it.
pub struct DemoWidget {
    store: ParameterStore,
    view: Rc<Cell<AudioParameters>>,
    view_sub: SubscriberId,
    backend: Arc<dyn StateBackend>,
    poll: Interval,
    polls: Dispatcher<Result<AudioParameters, DemoError>>,
    panel: GestureDispatchPanel,
    capture: CaptureSimulator,
    renderer: VisualizerRenderer,
    liveness: Liveness,
    mounted: bool,
}

impl DemoWidget {
    pub fn mount(
        backend: Arc<dyn StateBackend>,
        camera: Box<dyn Camera>,
        renderer: VisualizerRenderer,
        poll_period: Duration,
    ) -> Self {
        let liveness = Liveness::new();
        let mut store = ParameterStore::new();
        let view = Rc::new(Cell::new(store.get()));
        let sink = Rc::clone(&view);
        let view_sub = store.subscribe(move |params| {
            log::debug!(
                "State: volume={:.2} bass={:.2} tempo={:.2} pitch={:.2}",
                params.volume,
                params.bass,
                params.tempo,
                params.pitch
            );
            sink.set(*params);
        });

        log::info!("Demo mounted, polling every {}ms", poll_period.as_millis());

        Self {
            store,
            view,
            view_sub,
            panel: GestureDispatchPanel::new(Arc::clone(&backend), liveness.clone()),
            capture: CaptureSimulator::new(camera, Arc::clone(&backend), liveness.clone()),
            backend,
            poll: Interval::new(poll_period),
            polls: Dispatcher::new(liveness.clone()),
            renderer,
            liveness,
            mounted: true,
        }
    }

    /// Returns false when the input asks the demo to close.
    pub fn handle(&mut self, event: InputEvent, now: Instant) -> bool {
        if !self.mounted {
            return false;
        }
        match event {
            InputEvent::Gesture(gesture) => self.panel.trigger(gesture, &mut self.store, now),
            InputEvent::ToggleCapture => self.capture.toggle(now),
            InputEvent::Quit => return false,
        }
        true
    }

    /// One display-synchronized step: apply finished requests, start due
    /// ones, then draw.
    pub fn tick(&mut self, now: Instant, time_ms: f64, canvas: &mut Canvas) -> FrameReport {
        if self.mounted {
            self.apply_polls();
            if self.poll.poll(now) && self.polls.pending() == 0 {
                let backend = Arc::clone(&self.backend);
                self.polls.spawn(move || backend.fetch_state());
            }
            self.panel.tick(&mut self.store, now);
            self.capture.tick(now);
        }

        let params = self.view.get();
        let labels = self.renderer.render(canvas, &params, time_ms);
        let status = self.status_lines();
        self.renderer.draw_status(canvas, &status);
        FrameReport { params, labels, status }
    }

    fn apply_polls(&mut self) {
        for result in self.polls.drain() {
            match result {
                Ok(params) => {
                    self.store.replace(params);
                    self.store.clear_error();
                }
                Err(err) => {
                    log::warn!("State poll failed: {}", err);
                    self.store.set_error(&err);
                }
            }
        }
    }

    pub fn status_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(err) = self.store.error() {
            lines.push(err.to_string());
        }
        if let Some(err) = self.capture.error() {
            lines.push(err.to_string());
        }
        if let Some(gesture) = self.capture.recognized() {
            lines.push(format!("Detected: {}", gesture));
        }
        if let Some(active) = self.panel.active() {
            lines.push(format!("> {}", active.caption()));
        }
        if self.capture.is_streaming() {
            lines.push("Webcam active".to_string());
        }
        lines
    }

    pub fn params(&self) -> AudioParameters {
        self.store.get()
    }

    pub fn panel(&self) -> &GestureDispatchPanel {
        &self.panel
    }

    pub fn capture(&self) -> &CaptureSimulator {
        &self.capture
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Cancel the poll, stop the camera, and make every late result a no-op.
    pub fn teardown(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.poll.cancel();
        self.capture.stop();
        self.liveness.kill();
        self.store.unsubscribe(self.view_sub);
        log::info!("Demo torn down");
    }

    #[cfg(test)]
    fn wait_poll(&mut self, timeout: Duration) -> bool {
        match self.polls.wait_one(timeout) {
            Some(Ok(params)) => {
                self.store.replace(params);
                self.store.clear_error();
                true
            }
            Some(Err(err)) => {
                self.store.set_error(&err);
                true
            }
            None => false,
        }
    }
}

impl Drop for DemoWidget {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{NoCamera, SyntheticCamera};
    use crate::panel::tests::ScriptedBackend;
    use crate::params::GestureEvent;
    use crate::render::visualizer::Skin;

    fn widget(backend: Arc<ScriptedBackend>, camera: Box<dyn Camera>) -> DemoWidget {
        DemoWidget::mount(
            backend,
            camera,
            VisualizerRenderer::new(Skin::Orbs, None),
            Duration::from_millis(100),
        )
    }

    #[test]
    fn first_tick_polls_and_applies_remote_state() {
        let remote = AudioParameters { volume: 0.2, bass: 0.8, tempo: 1.5, pitch: 0.7 };
        let mut demo = widget(Arc::new(ScriptedBackend::new(remote)), Box::new(NoCamera));
        let mut canvas = Canvas::new(200, 100);
        let now = Instant::now();

        let first = demo.tick(now, 0.0, &mut canvas);
        assert_eq!(first.params, AudioParameters::default());
        assert!(demo.wait_poll(Duration::from_secs(2)));
        assert_eq!(demo.params(), remote);

        let second = demo.tick(now + Duration::from_millis(16), 16.0, &mut canvas);
        assert_eq!(second.params, remote);
        assert_eq!(second.labels[0].text, "Volume: 20%");
    }

    #[test]
    fn poll_failure_keeps_last_state_and_surfaces_message() {
        let backend = Arc::new(ScriptedBackend::new(AudioParameters::default()));
        *backend.state.lock().unwrap() = Err(DemoError::Connection("API error: 502".into()));
        let mut demo = widget(backend, Box::new(NoCamera));
        let mut canvas = Canvas::new(200, 100);
        let now = Instant::now();

        demo.tick(now, 0.0, &mut canvas);
        assert!(demo.wait_poll(Duration::from_secs(2)));
        assert_eq!(demo.params(), AudioParameters::default());
        assert_eq!(demo.status_lines(), vec!["Connection error: API error: 502".to_string()]);
    }

    #[test]
    fn gesture_input_goes_through_panel() {
        let backend = Arc::new(ScriptedBackend::new(AudioParameters::default()));
        let mut demo = widget(backend.clone(), Box::new(NoCamera));
        let now = Instant::now();

        assert!(demo.handle(InputEvent::Gesture(GestureEvent::PitchDown), now));
        assert!((demo.params().pitch - 0.9).abs() < 1e-12);
        assert_eq!(demo.panel().active(), Some(GestureEvent::PitchDown));
        assert!(!demo.handle(InputEvent::Quit, now));
    }

    #[test]
    fn camera_denial_is_reported_not_fatal() {
        let backend = Arc::new(ScriptedBackend::new(AudioParameters::default()));
        let mut demo = widget(backend, Box::new(NoCamera));
        let mut canvas = Canvas::new(200, 100);

        demo.handle(InputEvent::ToggleCapture, Instant::now());
        assert!(!demo.capture().is_streaming());
        let report = demo.tick(Instant::now(), 0.0, &mut canvas);
        assert!(report.status.iter().any(|l| l.starts_with("Webcam error")));
    }

    #[test]
    fn teardown_stops_everything_and_is_idempotent() {
        let backend = Arc::new(ScriptedBackend::new(AudioParameters::default()));
        let mut demo = widget(backend.clone(), Box::new(SyntheticCamera::new()));
        let mut canvas = Canvas::new(200, 100);
        let now = Instant::now();

        demo.handle(InputEvent::ToggleCapture, now);
        assert!(demo.capture().is_streaming());
        demo.tick(now, 0.0, &mut canvas);

        demo.teardown();
        demo.teardown();
        assert!(!demo.is_mounted());
        assert!(!demo.capture().is_streaming());

        let spawned = demo.capture().frames_sent();
        assert_eq!(spawned, 1);
        for i in 1..5 {
            demo.tick(now + Duration::from_millis(100 * i), 0.0, &mut canvas);
        }
        assert_eq!(demo.capture().frames_sent(), spawned);
        std::thread::sleep(Duration::from_millis(50));
        assert!(backend.frames_sent() <= 1);
        assert!(!demo.handle(InputEvent::Gesture(GestureEvent::VolumeUp), now));
        assert_eq!(demo.params(), AudioParameters::default());
    }
}
