//! # soundtouch-stream
//!
//! The live state channel: a single receive-only WebSocket connection to the
//! backend that pushes now-playing and volume changes for the selected device.
//!
//! The channel owns exactly one connection at a time. [`LiveChannel::open`]
//! tears down the previous connection before starting a new one, and a lost
//! connection is reported once through [`ChannelEvent::ConnectionLost`] and
//! never reopened automatically.
//!
//! ```rust,ignore
//! use soundtouch_stream::{LiveChannel, StreamConfig, ChannelEvent};
//! use tokio::sync::mpsc;
//!
//! let mut channel = LiveChannel::new(StreamConfig::from_base_url("http://localhost:3000")?)?;
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! channel.open(tx).await;
//!
//! while let Some(event) = rx.recv().await {
//!     match event {
//!         ChannelEvent::Volume { state, .. } => println!("volume {state}"),
//!         ChannelEvent::ConnectionLost { reason, .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

mod channel;
mod config;
mod error;
mod event;
pub mod message;

pub use channel::{ConnectionState, LiveChannel};
pub use config::{StreamConfig, CHANNEL_PATH, DEFAULT_ENDPOINT};
pub use error::*;
pub use event::*;
pub use message::PushMessage;
