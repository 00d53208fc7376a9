//! Device and playback state types shared by the client, the live channel and
//! the session layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder rendered for any field the backend did not report
pub const UNKNOWN: &str = "Unknown";

/// Slider position used when the device has not reported a volume yet
pub const DEFAULT_SLIDER_VOLUME: u8 = 20;

/// Where a selectable device entry came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeviceOrigin {
    /// Reported by the backend's discovery route
    #[default]
    Discovered,
    /// Typed in by the user
    Manual,
}

/// A playback device reported by discovery
///
/// `hostname` is the identity used for selection. The wire field for
/// `display_name` is `realname`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub hostname: String,
    #[serde(rename = "realname", default)]
    pub display_name: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: u16,
    #[serde(skip)]
    pub origin: DeviceOrigin,
}

impl DeviceDescriptor {
    /// Entry for a hostname the user typed in
    pub fn manual(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            display_name: String::new(),
            ip: String::new(),
            port: 0,
            origin: DeviceOrigin::Manual,
        }
    }

    pub fn is_manual(&self) -> bool {
        self.origin == DeviceOrigin::Manual
    }

    /// Human-readable label for device pickers
    pub fn label(&self) -> String {
        match self.origin {
            DeviceOrigin::Manual => format!("{} (Manual)", self.hostname),
            DeviceOrigin::Discovered => format!(
                "{} {} ({}:{})",
                self.display_name, self.hostname, self.ip, self.port
            ),
        }
    }
}

/// What the device is playing
///
/// Always replaced as a whole; `None` means the backend did not report the
/// field (empty strings count as not reported).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    pub artist: Option<String>,
    pub track: Option<String>,
}

impl PlaybackState {
    pub fn new(artist: Option<String>, track: Option<String>) -> Self {
        Self {
            artist: artist.filter(|s| !s.is_empty()),
            track: track.filter(|s| !s.is_empty()),
        }
    }

    pub fn artist(&self) -> &str {
        self.artist.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn track(&self) -> &str {
        self.track.as_deref().unwrap_or(UNKNOWN)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist(), self.track())
    }
}

/// The device's reported volume
///
/// The displayed number and the slider position are both derived from the
/// single `actual_volume` value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeState {
    pub actual_volume: Option<u8>,
}

impl VolumeState {
    pub fn new(actual_volume: Option<u8>) -> Self {
        Self { actual_volume }
    }

    /// Build from a raw wire number; anything outside 0..=100 is unknown
    pub fn from_raw(raw: Option<i64>) -> Self {
        let actual_volume = raw.and_then(|v| u8::try_from(v).ok()).filter(|v| *v <= 100);
        if raw.is_some() && actual_volume.is_none() {
            tracing::warn!(?raw, "Discarding out-of-range volume");
        }
        Self { actual_volume }
    }

    /// Slider position, falling back to a default when unknown
    pub fn slider_value(&self) -> u8 {
        self.actual_volume.unwrap_or(DEFAULT_SLIDER_VOLUME)
    }
}

impl fmt::Display for VolumeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.actual_volume {
            Some(volume) => write!(f, "{volume}"),
            None => f.write_str(UNKNOWN),
        }
    }
}

/// Result of a status poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub playback: PlaybackState,
    pub volume: VolumeState,
}

impl StatusSnapshot {
    /// Decode a status body
    ///
    /// Accepts the nested shape `{now_playing: {artist, track}, volume:
    /// {actual_volume}}` as well as the flat `{artist, track, volume}` shape.
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        let wire: WireStatus = serde_json::from_str(body)?;
        Ok(wire.into())
    }
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    #[serde(default)]
    now_playing: Option<WireNowPlaying>,
    #[serde(default)]
    volume: Option<WireVolume>,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    track: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireNowPlaying {
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    track: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireVolume {
    Flat(i64),
    Nested {
        #[serde(default)]
        actual_volume: Option<i64>,
    },
}

impl From<WireStatus> for StatusSnapshot {
    fn from(wire: WireStatus) -> Self {
        let playback = match wire.now_playing {
            Some(np) => PlaybackState::new(np.artist, np.track),
            None => PlaybackState::new(wire.artist, wire.track),
        };
        let raw_volume = match wire.volume {
            Some(WireVolume::Flat(v)) => Some(v),
            Some(WireVolume::Nested { actual_volume }) => actual_volume,
            None => None,
        };
        Self {
            playback,
            volume: VolumeState::from_raw(raw_volume),
        }
    }
}
