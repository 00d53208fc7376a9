//! Error types for the session layer

use soundtouch_api::{ApiError, Endpoint, ValidationError};
use soundtouch_stream::{CloseReason, StreamError};
use thiserror::Error;

/// Everything a session action can fail with
///
/// The display text of each variant is what gets passed to
/// [`SessionObserver::notify`](crate::SessionObserver::notify).
#[derive(Debug, Error)]
pub enum SessionError {
    /// Input rejected before any request was made
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend rejected the command or could not be reached
    #[error("{message} ({reason})")]
    CommandFailed {
        endpoint: Endpoint,
        message: String,
        status: Option<u16>,
        reason: String,
    },

    /// A response body or pushed frame could not be decoded
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// An action needs a selected device and there is none
    #[error("No device selected")]
    NoSelection,

    /// Discovery succeeded but reported nothing
    #[error("No devices found")]
    NoDevicesFound,

    /// The live channel of the current selection went away
    #[error("WebSocket connection closed ({0})")]
    ChannelClosed(CloseReason),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SessionError {
    /// Replace the user-facing message of a failed command
    pub(crate) fn with_message(self, new_message: &str) -> Self {
        match self {
            SessionError::CommandFailed {
                endpoint,
                status,
                reason,
                ..
            } => SessionError::CommandFailed {
                endpoint,
                message: new_message.to_string(),
                status,
                reason,
            },
            other => other,
        }
    }

    /// HTTP status of a failed command, when the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            SessionError::CommandFailed { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::Validation(_))
    }
}

impl From<ApiError> for SessionError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Validation(e) => SessionError::Validation(e),
            ApiError::CommandFailed {
                endpoint,
                message,
                status,
                reason,
            } => SessionError::CommandFailed {
                endpoint,
                message,
                status,
                reason,
            },
            ApiError::Protocol { endpoint, reason } => {
                SessionError::Protocol(format!("invalid response from {endpoint}: {reason}"))
            }
            ApiError::Configuration(e) => SessionError::Configuration(e),
        }
    }
}

impl From<StreamError> for SessionError {
    fn from(error: StreamError) -> Self {
        match error {
            StreamError::Protocol(e) => SessionError::Protocol(e),
            StreamError::Connect { endpoint, reason } => SessionError::ChannelClosed(
                CloseReason::ConnectFailed(format!("{endpoint}: {reason}")),
            ),
            StreamError::Configuration(e) => SessionError::Configuration(e),
        }
    }
}

/// Type alias for results that can return a SessionError
pub type Result<T> = std::result::Result<T, SessionError>;
