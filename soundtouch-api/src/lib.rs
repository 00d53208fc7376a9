//! Command client for the SoundTouch remote backend
//!
//! This crate talks to the backend's request/response API: it discovers
//! devices, selects one, fetches its status and issues playback, volume and
//! source commands. Every command input is validated before anything is sent,
//! so a rejected preset or a malformed URL never reaches the network.
//!
//! ```rust,ignore
//! use soundtouch_api::CommandClient;
//!
//! let client = CommandClient::new()?;
//! let devices = client.discover_devices().await?;
//! if let Some(device) = devices.first() {
//!     client.select_device(&device.hostname).await?;
//!     client.play_preset("3").await?;
//!     let status = client.fetch_status().await?;
//!     println!("Now playing: {}", status.playback);
//! }
//! ```

pub mod client;
pub mod command;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod types;

pub use client::CommandClient;
pub use command::{Command, Hostname, Preset, RadioUrl, TransportAction, Volume, YouTubeUrl};
pub use config::ClientConfig;
pub use endpoint::Endpoint;
pub use error::{ApiError, Result, ValidationError};
pub use types::{DeviceDescriptor, DeviceOrigin, PlaybackState, StatusSnapshot, VolumeState};
