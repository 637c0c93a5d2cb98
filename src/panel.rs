use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::DemoError;
use crate::params::{AudioParameters, GestureEvent};
use crate::remote::StateBackend;
use crate::store::ParameterStore;
use crate::task::{Dispatcher, Liveness, Timeout};

pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(500);

/// A backend answer, stamped with the trigger sequence it answers.
struct GestureReply {
    seq: u64,
    gesture: GestureEvent,
    result: Result<AudioParameters, DemoError>,
}

/// Eight gesture triggers. A trigger applies its delta locally right away,
/// then lets the backend's answer overwrite it.
///
/// Replies can arrive out of order; one answering an older trigger than the
/// newest reply already applied is dropped.
pub struct GestureDispatchPanel {
    backend: Arc<dyn StateBackend>,
    requests: Dispatcher<GestureReply>,
    next_seq: u64,
    applied_seq: u64,
    active: Option<GestureEvent>,
    highlight: Timeout,
}

impl GestureDispatchPanel {
    pub fn new(backend: Arc<dyn StateBackend>, liveness: Liveness) -> Self {
        Self {
            backend,
            requests: Dispatcher::new(liveness),
            next_seq: 1,
            applied_seq: 0,
            active: None,
            highlight: Timeout::default(),
        }
    }

    pub fn trigger(&mut self, gesture: GestureEvent, store: &mut ParameterStore, now: Instant) {
        log::debug!("Gesture trigger: {}", gesture);
        store.replace(store.get().apply(gesture));
        self.active = Some(gesture);
        self.highlight.arm(now, HIGHLIGHT_DURATION);

        let seq = self.next_seq;
        self.next_seq += 1;
        let backend = Arc::clone(&self.backend);
        self.requests.spawn(move || GestureReply {
            seq,
            gesture,
            result: backend.send_gesture(gesture),
        });
    }

    /// Apply any finished gesture requests and expire the highlight.
    pub fn tick(&mut self, store: &mut ParameterStore, now: Instant) {
        for reply in self.requests.drain() {
            self.apply_reply(reply, store);
        }
        if self.highlight.poll_expired(now) {
            self.active = None;
        }
    }

    fn apply_reply(&mut self, reply: GestureReply, store: &mut ParameterStore) {
        match reply.result {
            Ok(state) if reply.seq > self.applied_seq => {
                self.applied_seq = reply.seq;
                store.replace(state);
                store.clear_error();
            }
            Ok(_) => {
                log::debug!(
                    "Dropping stale reply to {} (#{} < #{})",
                    reply.gesture,
                    reply.seq,
                    self.applied_seq
                );
            }
            Err(err) => {
                log::warn!("Gesture {} failed: {}", reply.gesture, err);
                store.set_error(&err);
            }
        }
    }

    /// The control that fired most recently, while its highlight lasts.
    pub fn active(&self) -> Option<GestureEvent> {
        self.active
    }

    /// Rows as shown on the panel: a heading per parameter and its two
    /// button captions.
    pub fn rows(&self, params: &AudioParameters) -> Vec<(String, [String; 2])> {
        GestureEvent::ALL
            .chunks(2)
            .map(|pair| {
                let heading = params.label(pair[0].param());
                let mark = |g: GestureEvent| {
                    if self.active == Some(g) {
                        format!("[{}]", g.caption())
                    } else {
                        g.caption()
                    }
                };
                (heading, [mark(pair[0]), mark(pair[1])])
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn wait_reply(&mut self, store: &mut ParameterStore, timeout: Duration) -> bool {
        match self.requests.wait_one(timeout) {
            Some(reply) => {
                self.apply_reply(reply, store);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Backend whose answers are fixed up front.
    pub struct ScriptedBackend {
        pub state: Mutex<Result<AudioParameters, DemoError>>,
        pub gesture_reply: Mutex<Option<Result<AudioParameters, DemoError>>>,
        pub frame_reply: Mutex<Result<Vec<String>, DemoError>>,
        pub frames_sent: Mutex<usize>,
        pub gestures_sent: Mutex<Vec<GestureEvent>>,
    }

    impl ScriptedBackend {
        pub fn new(state: AudioParameters) -> Self {
            Self {
                state: Mutex::new(Ok(state)),
                gesture_reply: Mutex::new(None),
                frame_reply: Mutex::new(Ok(Vec::new())),
                frames_sent: Mutex::new(0),
                gestures_sent: Mutex::new(Vec::new()),
            }
        }

        pub fn frames_sent(&self) -> usize {
            *self.frames_sent.lock().unwrap()
        }
    }

    impl StateBackend for ScriptedBackend {
        fn fetch_state(&self) -> Result<AudioParameters, DemoError> {
            self.state.lock().unwrap().clone()
        }

        fn send_gesture(&self, gesture: GestureEvent) -> Result<AudioParameters, DemoError> {
            self.gestures_sent.lock().unwrap().push(gesture);
            match self.gesture_reply.lock().unwrap().clone() {
                Some(reply) => reply,
                None => self.fetch_state(),
            }
        }

        fn send_frame(&self, _jpeg_data_url: &str) -> Result<Vec<String>, DemoError> {
            *self.frames_sent.lock().unwrap() += 1;
            self.frame_reply.lock().unwrap().clone()
        }
    }

    #[test]
    fn optimistic_update_then_reconcile() {
        let authoritative = AudioParameters { volume: 0.95, ..Default::default() };
        let backend = Arc::new(ScriptedBackend::new(authoritative));
        let mut store = ParameterStore::with_params(AudioParameters { volume: 0.9, ..Default::default() });
        let mut panel = GestureDispatchPanel::new(backend.clone(), Liveness::new());
        let now = Instant::now();

        panel.trigger(GestureEvent::VolumeUp, &mut store, now);
        assert!((store.get().volume - 1.0).abs() < 1e-12);
        assert_eq!(panel.active(), Some(GestureEvent::VolumeUp));

        assert!(panel.wait_reply(&mut store, Duration::from_secs(2)));
        assert_eq!(store.get(), authoritative);
        assert_eq!(backend.gestures_sent.lock().unwrap().as_slice(), &[GestureEvent::VolumeUp]);
    }

    #[test]
    fn failure_keeps_optimistic_state_and_reports() {
        let backend = Arc::new(ScriptedBackend::new(AudioParameters::default()));
        *backend.gesture_reply.lock().unwrap() =
            Some(Err(DemoError::Connection("API error: 503".into())));
        let mut store = ParameterStore::new();
        let mut panel = GestureDispatchPanel::new(backend, Liveness::new());

        panel.trigger(GestureEvent::BassDown, &mut store, Instant::now());
        assert!(panel.wait_reply(&mut store, Duration::from_secs(2)));
        assert!((store.get().bass - 0.4).abs() < 1e-12);
        assert_eq!(store.error(), Some("Connection error: API error: 503"));
    }

    /// Answers each gesture with a fixed state after a per-gesture delay.
    struct DelayedBackend {
        replies: Vec<(GestureEvent, Duration, AudioParameters)>,
    }

    impl StateBackend for DelayedBackend {
        fn fetch_state(&self) -> Result<AudioParameters, DemoError> {
            Ok(AudioParameters::default())
        }

        fn send_gesture(&self, gesture: GestureEvent) -> Result<AudioParameters, DemoError> {
            let (_, delay, state) = self
                .replies
                .iter()
                .find(|(g, _, _)| *g == gesture)
                .copied()
                .ok_or_else(|| DemoError::Connection("unexpected gesture".into()))?;
            std::thread::sleep(delay);
            Ok(state)
        }

        fn send_frame(&self, _jpeg_data_url: &str) -> Result<Vec<String>, DemoError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn slow_reply_to_older_trigger_does_not_overwrite_newer() {
        let after_volume = AudioParameters { volume: 0.6, ..Default::default() };
        let after_bass = AudioParameters { volume: 0.6, bass: 0.6, ..Default::default() };
        let backend = Arc::new(DelayedBackend {
            replies: vec![
                (GestureEvent::VolumeUp, Duration::from_millis(200), after_volume),
                (GestureEvent::BassUp, Duration::ZERO, after_bass),
            ],
        });
        let mut store = ParameterStore::new();
        let mut panel = GestureDispatchPanel::new(backend, Liveness::new());
        let now = Instant::now();

        panel.trigger(GestureEvent::VolumeUp, &mut store, now);
        panel.trigger(GestureEvent::BassUp, &mut store, now);
        assert!(panel.wait_reply(&mut store, Duration::from_secs(2)));
        assert!(panel.wait_reply(&mut store, Duration::from_secs(2)));
        assert_eq!(store.get(), after_bass);
    }

    #[test]
    fn highlight_expires_after_half_a_second() {
        let backend = Arc::new(ScriptedBackend::new(AudioParameters::default()));
        let mut store = ParameterStore::new();
        let mut panel = GestureDispatchPanel::new(backend, Liveness::new());
        let now = Instant::now();

        panel.trigger(GestureEvent::PitchUp, &mut store, now);
        panel.tick(&mut store, now + Duration::from_millis(100));
        assert_eq!(panel.active(), Some(GestureEvent::PitchUp));
        let rows = panel.rows(&store.get());
        assert_eq!(rows[3].1[0], "[Pitch Up]");

        panel.tick(&mut store, now + HIGHLIGHT_DURATION);
        assert_eq!(panel.active(), None);
    }

    #[test]
    fn dead_panel_ignores_late_replies() {
        let backend = Arc::new(ScriptedBackend::new(AudioParameters { tempo: 2.0, ..Default::default() }));
        let liveness = Liveness::new();
        let mut store = ParameterStore::new();
        let mut panel = GestureDispatchPanel::new(backend, liveness.clone());

        panel.trigger(GestureEvent::TempoUp, &mut store, Instant::now());
        let optimistic = store.get();
        liveness.kill();
        assert!(!panel.wait_reply(&mut store, Duration::from_millis(200)));
        assert_eq!(store.get(), optimistic);
    }
}
