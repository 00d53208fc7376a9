//! Validated command inputs
//!
//! Each newtype can only be built from input that passed its check, so a
//! [`Command`] value is always safe to send.

use std::fmt;
use std::str::FromStr;

use crate::{Endpoint, ValidationError};

/// Device hostname (or URL) accepted by the backend's select route
///
/// Surrounding whitespace is trimmed; nothing else is checked, so manually
/// typed hostnames that discovery never reported are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hostname(String);

impl Hostname {
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyHostname);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Hostname {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Preset slot, exactly one digit from 1 to 6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Preset(u8);

impl Preset {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub fn number(&self) -> u8 {
        self.0
    }
}

impl FromStr for Preset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [digit @ b'1'..=b'6'] => Ok(Self(digit - b'0')),
            _ => Err(ValidationError::InvalidPreset {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<u8> for Preset {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidPreset {
                value: value.to_string(),
            })
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Absolute volume level, an integer in 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Volume(u8);

impl Volume {
    pub const MAX: u8 = 100;

    pub fn level(&self) -> u8 {
        self.0
    }
}

impl FromStr for Volume {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidVolume {
            value: s.to_string(),
        };
        let level: i64 = s.trim().parse().map_err(|_| invalid())?;
        Self::try_from(level).map_err(|_| invalid())
    }
}

impl TryFrom<i64> for Volume {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (0..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::InvalidVolume {
                value: value.to_string(),
            })
        }
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Internet radio stream location, any well-formed absolute URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioUrl(String);

impl RadioUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RadioUrl {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        url::Url::parse(s).map_err(|e| ValidationError::InvalidRadioUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(s.to_string()))
    }
}

/// YouTube page URL: absolute and containing `youtube.com`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YouTubeUrl(String);

impl YouTubeUrl {
    const HOST_MARKER: &'static str = "youtube.com";

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for YouTubeUrl {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if url::Url::parse(s).is_err() || !s.contains(Self::HOST_MARKER) {
            return Err(ValidationError::InvalidYouTubeUrl {
                value: s.to_string(),
            });
        }
        Ok(Self(s.to_string()))
    }
}

/// Opaque transport key forwarded verbatim (e.g. `PLAY`, `PAUSE`, `NEXT_TRACK`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportAction(String);

impl TransportAction {
    pub fn new(action: impl Into<String>) -> Self {
        Self(action.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TransportAction {
    fn from(action: &str) -> Self {
        Self::new(action)
    }
}

impl fmt::Display for TransportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated, ready-to-send backend command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelectDevice(Hostname),
    Preset(Preset),
    Volume(Volume),
    Radio(RadioUrl),
    YouTube(YouTubeUrl),
    Transport(TransportAction),
}

impl Command {
    /// Route this command is posted to
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Command::SelectDevice(_) => Endpoint::SelectDevice,
            Command::Preset(_) => Endpoint::Preset,
            Command::Volume(_) => Endpoint::Volume,
            Command::Radio(_) => Endpoint::Radio,
            Command::YouTube(_) => Endpoint::YouTube,
            Command::Transport(_) => Endpoint::Play,
        }
    }

    /// Value carried in the `url` field of the request body
    pub fn value(&self) -> String {
        match self {
            Command::SelectDevice(hostname) => hostname.to_string(),
            Command::Preset(preset) => preset.to_string(),
            Command::Volume(volume) => volume.to_string(),
            Command::Radio(url) => url.as_str().to_string(),
            Command::YouTube(url) => url.as_str().to_string(),
            Command::Transport(action) => action.to_string(),
        }
    }

    /// JSON request body
    pub fn payload(&self) -> serde_json::Value {
        serde_json::json!({ "url": self.value() })
    }

    /// Confirmation shown once the backend accepted the command
    pub fn success_message(&self) -> String {
        match self {
            Command::SelectDevice(hostname) => format!("Selected device: {hostname}"),
            Command::Preset(preset) => format!("Playing Preset {preset}"),
            Command::Volume(volume) => format!("Volume set to {volume}"),
            Command::Radio(_) => "Playing radio stream".to_string(),
            Command::YouTube(_) => "Playing YouTube audio".to_string(),
            Command::Transport(action) => format!("{action} successful"),
        }
    }

    /// Description of the action used when the backend rejects it
    pub fn failure_message(&self) -> String {
        match self {
            Command::SelectDevice(_) => "Failed to select device".to_string(),
            Command::Preset(_) => "Failed to play preset or no device selected".to_string(),
            Command::Volume(_) => "Failed to set volume or no device selected".to_string(),
            Command::Radio(_) => "Failed to play radio or no device selected".to_string(),
            Command::YouTube(_) => "Failed to play YouTube or no device selected".to_string(),
            Command::Transport(action) => format!(
                "Failed to {} or no device selected",
                action.as_str().to_lowercase()
            ),
        }
    }
}
