//! JSON bodies exchanged with the backend's `/api/*` routes.

use serde::{Deserialize, Serialize};

use crate::error::DemoError;
use crate::params::{AudioParameters, GestureEvent};

pub const STATE_PATH: &str = "/api/state";
pub const GESTURE_PATH: &str = "/api/gesture";
pub const FRAME_PATH: &str = "/api/gesture-frame";

#[derive(Debug, Serialize)]
pub struct GestureRequest {
    pub gesture: GestureEvent,
}

#[derive(Debug, Serialize)]
pub struct FrameRequest<'a> {
    pub frame: &'a str,
}

/// The gesture route answers with a wrapped state, the bare parameter
/// object, or a plain acknowledgement carrying no state at all.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GestureResponse {
    Wrapped { state: AudioParameters },
    Bare(AudioParameters),
    Ack(serde_json::Value),
}

impl GestureResponse {
    pub fn into_state(self) -> Option<AudioParameters> {
        match self {
            GestureResponse::Wrapped { state } => Some(state),
            GestureResponse::Bare(state) => Some(state),
            GestureResponse::Ack(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FrameResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub gestures: Vec<String>,
}

pub fn decode_state(body: &str) -> Result<AudioParameters, DemoError> {
    let params: AudioParameters = serde_json::from_str(body)?;
    params.validate()
}

/// `Ok(None)` means the backend acknowledged without returning state.
pub fn decode_gesture_reply(body: &str) -> Result<Option<AudioParameters>, DemoError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let reply: GestureResponse = serde_json::from_str(body)?;
    reply.into_state().map(AudioParameters::validate).transpose()
}

pub fn decode_frame_reply(body: &str) -> Result<Vec<String>, DemoError> {
    let reply: FrameResponse = serde_json::from_str(body)?;
    if reply.status.as_deref() == Some("error") {
        return Err(DemoError::Connection("backend rejected frame".into()));
    }
    Ok(reply.gestures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_decodes_exactly() {
        let params = decode_state(r#"{"volume":0.3,"bass":0.7,"tempo":1.4,"pitch":0.6}"#).unwrap();
        assert_eq!(params, AudioParameters { volume: 0.3, bass: 0.7, tempo: 1.4, pitch: 0.6 });
    }

    #[test]
    fn state_missing_field_is_decode_error() {
        let err = decode_state(r#"{"volume":0.3,"bass":0.7,"tempo":1.4}"#).unwrap_err();
        assert!(matches!(err, DemoError::Decode(_)));
        assert!(matches!(decode_state("<html>"), Err(DemoError::Decode(_))));
    }

    #[test]
    fn bpm_tempo_is_rejected_not_coerced() {
        assert_eq!(
            decode_state(r#"{"volume":0.5,"bass":0.5,"tempo":120.0,"pitch":1.0}"#),
            Err(DemoError::Decode("tempo out of range: 120 not in [0.5, 2]".into()))
        );
    }

    #[test]
    fn gesture_reply_accepts_both_shapes() {
        let wrapped = decode_gesture_reply(
            r#"{"state":{"volume":1.0,"bass":0.5,"tempo":1.0,"pitch":1.0}}"#,
        )
        .unwrap();
        let bare = decode_gesture_reply(r#"{"volume":1.0,"bass":0.5,"tempo":1.0,"pitch":1.0}"#).unwrap();
        assert_eq!(wrapped, bare);
        assert_eq!(wrapped.unwrap().volume, 1.0);
    }

    #[test]
    fn gesture_ack_has_no_state() {
        let reply = decode_gesture_reply(r#"{"status":"success","gesture":"volume_up"}"#).unwrap();
        assert!(reply.is_none());
        assert!(decode_gesture_reply("").unwrap().is_none());
    }

    #[test]
    fn gesture_request_body() {
        let body = serde_json::to_string(&GestureRequest { gesture: GestureEvent::PitchDown }).unwrap();
        assert_eq!(body, r#"{"gesture":"pitch_down"}"#);
    }

    #[test]
    fn frame_reply_variants() {
        let labels = decode_frame_reply(r#"{"status":"success","gestures":["bass_up","wave"]}"#).unwrap();
        assert_eq!(labels, vec!["bass_up", "wave"]);
        assert!(decode_frame_reply(r#"{"status":"frame received"}"#).unwrap().is_empty());
        assert!(decode_frame_reply(r#"{"status":"error","gestures":[]}"#).is_err());
    }
}
