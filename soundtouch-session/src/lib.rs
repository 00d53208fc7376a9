//! # soundtouch-session
//!
//! The device session layer of the SoundTouch remote. A
//! [`SessionCoordinator`] keeps track of which device is selected, owns the
//! live channel bound to that selection and merges status polls and pushed
//! updates into one view that it reports through a [`SessionObserver`].
//!
//! ## Ordering
//!
//! - The live channel is only reopened after the backend accepted a
//!   selection; a failed selection changes nothing.
//! - Polls and channel events carry the [`SelectionTag`] they were started
//!   for. Anything tagged with an older selection is dropped.
//! - A push that arrives while a poll is in flight is not overwritten by the
//!   poll's late answer.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use soundtouch_session::{SessionConfig, SessionCoordinator, SessionObserver};
//!
//! let config = SessionConfig::from_base_url("http://localhost:3000")?;
//! let mut session = SessionCoordinator::new(config, Arc::new(MyObserver))?;
//!
//! session.discover().await?;
//! session.set_volume("30").await?;
//! ```

mod config;
mod coordinator;
mod error;
pub mod logging;
mod observer;
pub mod state;

pub use config::SessionConfig;
pub use coordinator::SessionCoordinator;
pub use error::{Result, SessionError};
pub use observer::{NullObserver, SessionObserver};
pub use state::{PollOutcome, SelectionTag};

// Types that show up in the observer and coordinator signatures
pub use soundtouch_api::{
    DeviceDescriptor, PlaybackState, Preset, RadioUrl, TransportAction, Volume, VolumeState,
    YouTubeUrl,
};
pub use soundtouch_stream::{CloseReason, ConnectionState};
