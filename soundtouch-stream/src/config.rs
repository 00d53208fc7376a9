//! Configuration types for the soundtouch-stream crate

use std::time::Duration;

use crate::StreamError;

/// Default live channel endpoint
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:3000/ws";

/// Path of the live channel relative to the backend base URL
pub const CHANNEL_PATH: &str = "/ws";

/// Configuration for the [`LiveChannel`](crate::LiveChannel)
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// WebSocket endpoint; fixed, independent of the selected device
    /// Default: ws://localhost:3000/ws
    pub endpoint: String,

    /// Timeout for the WebSocket handshake
    /// Default: 5 seconds
    pub connect_timeout: Duration,

    /// How long `close()` waits for the reader task before aborting it
    /// Default: 2 seconds
    pub close_timeout: Duration,

    /// Largest accepted inbound message
    /// Default: 64 KiB
    pub max_message_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: Duration::from_secs(5),
            close_timeout: Duration::from_secs(2),
            max_message_size: 64 * 1024,
        }
    }
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the channel endpoint from the backend's HTTP base URL
    ///
    /// `http://host:3000` becomes `ws://host:3000/ws`, `https` maps to `wss`.
    pub fn from_base_url(base_url: &str) -> Result<Self, StreamError> {
        let mut url = url::Url::parse(base_url).map_err(|e| {
            StreamError::Configuration(format!("Invalid base URL '{base_url}': {e}"))
        })?;

        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => {
                return Err(StreamError::Configuration(format!(
                    "Base URL must use http or https, got '{other}'"
                )))
            }
        };
        url.set_scheme(scheme).map_err(|_| {
            StreamError::Configuration(format!("Cannot derive WebSocket URL from '{base_url}'"))
        })?;
        url.set_path(CHANNEL_PATH);
        url.set_query(None);

        Ok(Self {
            endpoint: url.to_string(),
            ..Default::default()
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), StreamError> {
        let url = url::Url::parse(&self.endpoint).map_err(|e| {
            StreamError::Configuration(format!("Invalid endpoint '{}': {e}", self.endpoint))
        })?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(StreamError::Configuration(format!(
                "Endpoint must use ws or wss, got '{}'",
                url.scheme()
            )));
        }

        if self.connect_timeout == Duration::ZERO {
            return Err(StreamError::Configuration(
                "Connect timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_message_size == 0 {
            return Err(StreamError::Configuration(
                "Max message size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
