//! Configuration for the session coordinator

use soundtouch_api::ClientConfig;
use soundtouch_stream::StreamConfig;

use crate::{Result, SessionError};

/// Configuration for a [`SessionCoordinator`](crate::SessionCoordinator)
///
/// The command client and the live channel talk to the same backend, so the
/// usual way to build one is [`SessionConfig::from_base_url`].
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Request/response API settings
    pub client: ClientConfig,

    /// Live channel settings
    pub stream: StreamConfig,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point both halves at one backend; the channel lives at `<base>/ws`
    pub fn from_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: ClientConfig::new().with_base_url(base_url),
            stream: StreamConfig::from_base_url(base_url)?,
        })
    }

    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    pub fn with_stream(mut self, stream: StreamConfig) -> Self {
        self.stream = stream;
        self
    }

    /// Validate both halves
    pub fn validate(&self) -> Result<()> {
        self.client.validate().map_err(SessionError::from)?;
        self.stream.validate().map_err(SessionError::from)?;
        Ok(())
    }
}
