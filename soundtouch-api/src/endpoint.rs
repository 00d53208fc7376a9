/// The backend routes the command client talks to
///
/// Every POST route takes the same `{ "url": <value> }` body, whatever the
/// value actually means for that route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Current now-playing and volume snapshot
    Status,
    /// Devices found on the local network
    Discover,
    /// Target device for every following command
    SelectDevice,
    /// Quick-play slot 1..6
    Preset,
    /// Absolute volume 0..100
    Volume,
    /// Internet radio stream
    Radio,
    /// YouTube audio
    YouTube,
    /// Transport key (play, pause, next...)
    Play,
}

impl Endpoint {
    /// Path relative to the backend base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Status => "/api/status",
            Endpoint::Discover => "/api/discover",
            Endpoint::SelectDevice => "/api/select_device",
            Endpoint::Preset => "/api/preset",
            Endpoint::Volume => "/api/volume",
            Endpoint::Radio => "/api/radio",
            Endpoint::YouTube => "/api/youtube",
            Endpoint::Play => "/api/play",
        }
    }

    /// HTTP method used for this route
    pub fn method(&self) -> reqwest::Method {
        match self {
            Endpoint::Status | Endpoint::Discover => reqwest::Method::GET,
            _ => reqwest::Method::POST,
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Status => "status",
            Endpoint::Discover => "discover",
            Endpoint::SelectDevice => "select_device",
            Endpoint::Preset => "preset",
            Endpoint::Volume => "volume",
            Endpoint::Radio => "radio",
            Endpoint::YouTube => "youtube",
            Endpoint::Play => "play",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}
