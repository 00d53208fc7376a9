//! Decoding of pushed channel frames
//!
//! Frames are JSON objects. An `error` field wins over everything else;
//! otherwise the `type` field selects the payload. Unknown types decode to
//! [`PushMessage::Unrecognized`] and are skipped by the channel.

use serde_json::{Map, Value};
use soundtouch_api::{PlaybackState, StatusSnapshot, VolumeState};

use crate::{Result, StreamError};

/// A decoded push frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushMessage {
    /// `{"type":"now_playing","artist":..,"track":..}`
    NowPlaying(PlaybackState),
    /// `{"type":"volume","actual_volume":..}`, `volume` is accepted as the field name too
    Volume(VolumeState),
    /// `{"type":"status","artist":..,"track":..,"volume":..}`
    Status(StatusSnapshot),
    /// `{"error":"..."}`
    Error(String),
    /// Any other `type`, or none at all
    Unrecognized(Option<String>),
}

impl PushMessage {
    /// Decode a text frame
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| StreamError::Protocol(e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(StreamError::Protocol(format!(
                "expected a JSON object, got {}",
                kind_of(&value)
            )));
        };

        if let Some(error) = error_field(&fields) {
            return Ok(PushMessage::Error(error));
        }

        let kind = fields.get("type").and_then(Value::as_str);
        let message = match kind {
            Some("now_playing") => PushMessage::NowPlaying(playback_from(&fields)),
            Some("volume") => PushMessage::Volume(volume_from(&fields)),
            Some("status") => PushMessage::Status(StatusSnapshot {
                playback: playback_from(&fields),
                volume: volume_from(&fields),
            }),
            other => PushMessage::Unrecognized(other.map(str::to_string)),
        };
        Ok(message)
    }
}

fn error_field(fields: &Map<String, Value>) -> Option<String> {
    match fields.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn playback_from(fields: &Map<String, Value>) -> PlaybackState {
    let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);
    PlaybackState::new(text("artist"), text("track"))
}

fn volume_from(fields: &Map<String, Value>) -> VolumeState {
    let raw = fields
        .get("actual_volume")
        .and_then(Value::as_i64)
        .or_else(|| fields.get("volume").and_then(Value::as_i64));
    VolumeState::from_raw(raw)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
