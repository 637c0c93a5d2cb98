use crate::error::DemoError;
use crate::params::AudioParameters;

pub type SubscriberId = usize;

type Subscriber = Box<dyn FnMut(&AudioParameters)>;

/// Current parameters plus the last surfaced error, owned by one widget.
///
/// `replace` is the only way the parameters change and always swaps the
/// whole structure.
pub struct ParameterStore {
    params: AudioParameters,
    error: Option<String>,
    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_id: SubscriberId,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::with_params(AudioParameters::default())
    }

    pub fn with_params(params: AudioParameters) -> Self {
        Self {
            params,
            error: None,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn get(&self) -> AudioParameters {
        self.params
    }

    pub fn replace(&mut self, params: AudioParameters) {
        if params == self.params {
            return;
        }
        self.params = params;
        for (_, notify) in self.subscribers.iter_mut() {
            notify(&self.params);
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, err: &DemoError) {
        self.error = Some(err.to_string());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn subscribe<F>(&mut self, notify: F) -> SubscriberId
    where
        F: FnMut(&AudioParameters) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(notify)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
