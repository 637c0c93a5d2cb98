pub mod wire;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::DemoError;
use crate::params::{AudioParameters, GestureEvent};

/// The backend contract every widget talks to. Implementations are called
/// from worker threads, never from the frame loop.
pub trait StateBackend: Send + Sync {
    fn fetch_state(&self) -> Result<AudioParameters, DemoError>;

    /// The backend is the sole authority on the resulting state.
    fn send_gesture(&self, gesture: GestureEvent) -> Result<AudioParameters, DemoError>;

    /// Submit one `data:image/jpeg;base64,...` frame and return whatever
    /// gesture labels the backend recognized in it.
    fn send_frame(&self, jpeg_data_url: &str) -> Result<Vec<String>, DemoError>;
}

/// Talks to the external service over HTTP.
pub struct HttpBackend {
    client: reqwest::blocking::Client,
    origin: String,
}

impl HttpBackend {
    pub fn new(origin: &str, timeout: Duration) -> Result<Self, DemoError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DemoError::Connection(format!("client build failed: {}", e)))?;
        Ok(Self {
            client,
            origin: origin.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.origin, path)
    }

    fn read_body(response: reqwest::blocking::Response) -> Result<String, DemoError> {
        let status = response.status();
        if !status.is_success() {
            return Err(DemoError::Connection(format!("API error: {}", status.as_u16())));
        }
        Ok(response.text()?)
    }
}

impl StateBackend for HttpBackend {
    fn fetch_state(&self) -> Result<AudioParameters, DemoError> {
        let response = self.client.get(self.url(wire::STATE_PATH)).send()?;
        wire::decode_state(&Self::read_body(response)?)
    }

    fn send_gesture(&self, gesture: GestureEvent) -> Result<AudioParameters, DemoError> {
        let response = self
            .client
            .post(self.url(wire::GESTURE_PATH))
            .json(&wire::GestureRequest { gesture })
            .send()?;
        match wire::decode_gesture_reply(&Self::read_body(response)?)? {
            Some(state) => Ok(state),
            None => self.fetch_state(),
        }
    }

    fn send_frame(&self, jpeg_data_url: &str) -> Result<Vec<String>, DemoError> {
        let response = self
            .client
            .post(self.url(wire::FRAME_PATH))
            .json(&wire::FrameRequest { frame: jpeg_data_url })
            .send()?;
        wire::decode_frame_reply(&Self::read_body(response)?)
    }
}

/// Backend-free stand-in: keeps the authoritative parameters in memory and
/// "recognizes" a random gesture in roughly one of every `recognize_every`
/// frames it receives.
pub struct SimulatedBackend {
    state: Mutex<AudioParameters>,
    rng: Mutex<SmallRng>,
    recognize_every: u32,
}

impl SimulatedBackend {
    pub fn new(recognize_every: u32) -> Self {
        Self::with_rng(recognize_every, SmallRng::from_entropy())
    }

    #[cfg(test)]
    pub fn seeded(recognize_every: u32, seed: u64) -> Self {
        Self::with_rng(recognize_every, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(recognize_every: u32, rng: SmallRng) -> Self {
        Self {
            state: Mutex::new(AudioParameters::default()),
            rng: Mutex::new(rng),
            recognize_every: recognize_every.max(1),
        }
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, AudioParameters>, DemoError> {
        self.state
            .lock()
            .map_err(|_| DemoError::Connection("simulated backend poisoned".into()))
    }
}

impl StateBackend for SimulatedBackend {
    fn fetch_state(&self) -> Result<AudioParameters, DemoError> {
        Ok(*self.lock_state()?)
    }

    fn send_gesture(&self, gesture: GestureEvent) -> Result<AudioParameters, DemoError> {
        let mut state = self.lock_state()?;
        *state = state.apply(gesture);
        Ok(*state)
    }

    fn send_frame(&self, jpeg_data_url: &str) -> Result<Vec<String>, DemoError> {
        if !jpeg_data_url.starts_with("data:image/jpeg;base64,") {
            return Err(DemoError::Decode("frame is not a JPEG data URL".into()));
        }
        let picked = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| DemoError::Connection("simulated backend poisoned".into()))?;
            if rng.gen_range(0..self.recognize_every) == 0 {
                Some(GestureEvent::ALL[rng.gen_range(0..GestureEvent::ALL.len())])
            } else {
                None
            }
        };
        let Some(gesture) = picked else {
            return Ok(Vec::new());
        };
        log::debug!("Simulated recognition: {}", gesture);
        self.send_gesture(gesture)?;
        Ok(vec![gesture.as_str().to_string()])
    }
}
