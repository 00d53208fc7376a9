use tracing::{debug, warn};

use crate::{
    ApiError, ClientConfig, Command, DeviceDescriptor, Endpoint, Hostname, Preset, RadioUrl,
    Result, StatusSnapshot, TransportAction, Volume, YouTubeUrl,
};

/// A client for the backend's request/response API
///
/// Each call is a single attempt. Failures are returned to the caller as-is
/// so they can be surfaced to the user; nothing is retried.
///
/// The `*_device`/`play_*`/`set_volume` helpers accept raw user input and
/// validate it before building the request. Use [`CommandClient::execute`]
/// when the input has already been validated into a [`Command`].
#[derive(Debug, Clone)]
pub struct CommandClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl CommandClient {
    /// Create a client for the default backend address
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a validated command
    pub async fn execute(&self, command: &Command) -> Result<()> {
        let endpoint = command.endpoint();
        let url = self.config.url_for(endpoint.path());
        debug!(endpoint = endpoint.name(), value = %command.value(), "POST {}", url);

        let response = self
            .http
            .post(&url)
            .json(&command.payload())
            .send()
            .await
            .map_err(|e| {
                warn!(endpoint = endpoint.name(), error = %e, "Request could not be sent");
                ApiError::CommandFailed {
                    endpoint,
                    message: command.failure_message(),
                    status: None,
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint = endpoint.name(), %status, "Command rejected by backend");
            return Err(ApiError::CommandFailed {
                endpoint,
                message: command.failure_message(),
                status: Some(status.as_u16()),
                reason: describe_status(status, &body),
            });
        }

        Ok(())
    }

    /// Make `hostname` the target of every following command
    pub async fn select_device(&self, hostname: &str) -> Result<Hostname> {
        let hostname = Hostname::new(hostname)?;
        self.execute(&Command::SelectDevice(hostname.clone())).await?;
        Ok(hostname)
    }

    /// Play a preset slot; anything but a single digit 1..6 is rejected
    pub async fn play_preset(&self, preset: &str) -> Result<Preset> {
        let preset: Preset = preset.parse()?;
        self.execute(&Command::Preset(preset)).await?;
        Ok(preset)
    }

    /// Set the absolute volume; anything but an integer 0..100 is rejected
    pub async fn set_volume(&self, volume: &str) -> Result<Volume> {
        let volume: Volume = volume.parse()?;
        self.execute(&Command::Volume(volume)).await?;
        Ok(volume)
    }

    /// Stream an internet radio URL
    pub async fn play_radio_url(&self, url: &str) -> Result<RadioUrl> {
        let url: RadioUrl = url.parse()?;
        self.execute(&Command::Radio(url.clone())).await?;
        Ok(url)
    }

    /// Stream the audio of a YouTube URL
    pub async fn play_youtube_url(&self, url: &str) -> Result<YouTubeUrl> {
        let url: YouTubeUrl = url.parse()?;
        self.execute(&Command::YouTube(url.clone())).await?;
        Ok(url)
    }

    /// Forward a transport key verbatim
    pub async fn play_transport_action(&self, action: &str) -> Result<TransportAction> {
        let action = TransportAction::from(action);
        self.execute(&Command::Transport(action.clone())).await?;
        Ok(action)
    }

    /// Fetch the current now-playing/volume snapshot of the selected device
    pub async fn fetch_status(&self) -> Result<StatusSnapshot> {
        let body = self
            .get(Endpoint::Status, "Failed to fetch status or no device selected")
            .await?;
        StatusSnapshot::from_json(&body).map_err(|e| ApiError::Protocol {
            endpoint: Endpoint::Status,
            reason: e.to_string(),
        })
    }

    /// List the devices the backend can see; an empty list is not an error
    pub async fn discover_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        let body = self
            .get(Endpoint::Discover, "Failed to discover devices")
            .await?;
        let devices: Vec<DeviceDescriptor> =
            serde_json::from_str(&body).map_err(|e| ApiError::Protocol {
                endpoint: Endpoint::Discover,
                reason: e.to_string(),
            })?;
        debug!(count = devices.len(), "Discovered devices");
        Ok(devices)
    }

    async fn get(&self, endpoint: Endpoint, failure: &str) -> Result<String> {
        let url = self.config.url_for(endpoint.path());
        debug!(endpoint = endpoint.name(), "GET {}", url);

        let failed = |status: Option<u16>, reason: String| ApiError::CommandFailed {
            endpoint,
            message: failure.to_string(),
            status,
            reason,
        };

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| failed(None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint = endpoint.name(), %status, "Query rejected by backend");
            return Err(failed(Some(status.as_u16()), describe_status(status, &body)));
        }

        response
            .text()
            .await
            .map_err(|e| failed(Some(status.as_u16()), e.to_string()))
    }
}

fn describe_status(status: reqwest::StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    }
}
