//! Event types for the soundtouch-stream crate.

use std::fmt;

use soundtouch_api::{PlaybackState, VolumeState};
use tokio::sync::mpsc;

/// Identifies one connection opened by a [`LiveChannel`](crate::LiveChannel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Why a connection ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// `close()` was called, or the connection was superseded by `open()`
    Local,
    /// The backend sent a close frame or ended the stream
    Remote(Option<String>),
    /// The handshake never completed
    ConnectFailed(String),
    /// Transport error while reading
    Error(String),
}

impl CloseReason {
    /// True when the close was not requested by this client
    pub fn is_unexpected(&self) -> bool {
        !matches!(self, CloseReason::Local)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Local => f.write_str("closed locally"),
            CloseReason::Remote(Some(reason)) => write!(f, "closed by backend: {reason}"),
            CloseReason::Remote(None) => f.write_str("closed by backend"),
            CloseReason::ConnectFailed(reason) => write!(f, "connect failed: {reason}"),
            CloseReason::Error(reason) => write!(f, "transport error: {reason}"),
        }
    }
}

/// Events delivered by a live connection, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The handshake completed
    Opened { connection: ConnectionId },

    /// New now-playing information
    Playback {
        connection: ConnectionId,
        state: PlaybackState,
    },

    /// New volume
    Volume {
        connection: ConnectionId,
        state: VolumeState,
    },

    /// The backend pushed an explicit `error` frame
    RemoteError {
        connection: ConnectionId,
        message: String,
    },

    /// A frame could not be decoded; the connection stays up
    ProtocolError {
        connection: ConnectionId,
        error: String,
    },

    /// The connection is gone; always the last event of a connection
    ConnectionLost {
        connection: ConnectionId,
        reason: CloseReason,
    },
}

impl ChannelEvent {
    pub fn connection(&self) -> ConnectionId {
        match self {
            ChannelEvent::Opened { connection }
            | ChannelEvent::Playback { connection, .. }
            | ChannelEvent::Volume { connection, .. }
            | ChannelEvent::RemoteError { connection, .. }
            | ChannelEvent::ProtocolError { connection, .. }
            | ChannelEvent::ConnectionLost { connection, .. } => *connection,
        }
    }
}

/// Receiver of channel events
///
/// Called from the connection's reader task, one event at a time.
pub trait ChannelSink: Send + Sync + 'static {
    fn deliver(&self, event: ChannelEvent);
}

impl ChannelSink for mpsc::UnboundedSender<ChannelEvent> {
    fn deliver(&self, event: ChannelEvent) {
        if self.send(event).is_err() {
            tracing::trace!("Channel event receiver dropped");
        }
    }
}
