use thiserror::Error;

/// Failures a widget surfaces inline. None of them stop the frame loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DemoError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Webcam error: {0}")]
    MediaAccess(String),
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for DemoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DemoError::Decode(err.to_string())
        } else {
            DemoError::Connection(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DemoError {
    fn from(err: serde_json::Error) -> Self {
        DemoError::Decode(err.to_string())
    }
}
