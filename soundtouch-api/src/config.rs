//! Configuration for the command client

use std::time::Duration;

use crate::ApiError;

/// Default backend base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Configuration for the [`CommandClient`](crate::CommandClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing path
    /// Default: http://localhost:3000
    pub base_url: String,

    /// Timeout for establishing the TCP connection
    /// Default: 5 seconds
    pub connect_timeout: Duration,

    /// Timeout for a whole request, including the response body
    /// Default: 10 seconds (discovery on the backend takes about 5)
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorter timeouts for a backend on the same machine
    pub fn local() -> Self {
        Self {
            connect_timeout: Duration::from_secs(1),
            request_timeout: Duration::from_secs(7),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), ApiError> {
        let url = url::Url::parse(&self.base_url).map_err(|e| {
            ApiError::Configuration(format!("Invalid base URL '{}': {e}", self.base_url))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::Configuration(format!(
                "Base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.connect_timeout == Duration::ZERO || self.request_timeout == Duration::ZERO {
            return Err(ApiError::Configuration(
                "Timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Absolute URL for a route path
    pub(crate) fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
