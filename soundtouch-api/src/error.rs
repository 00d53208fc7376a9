use thiserror::Error;

use crate::Endpoint;

/// Client-side input rejections
///
/// Every variant is raised before a request is built, so no network call is
/// made for invalid input. The display text is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Hostname was empty or whitespace only
    #[error("Please enter a hostname")]
    EmptyHostname,

    /// Preset was not a single digit between 1 and 6
    #[error("Preset must be 1-6")]
    InvalidPreset { value: String },

    /// Volume was not an integer in 0..=100
    #[error("Volume must be 0-100")]
    InvalidVolume { value: String },

    /// Radio stream URL did not parse as an absolute URL
    #[error("Invalid radio URL")]
    InvalidRadioUrl { value: String, reason: String },

    /// YouTube URL was malformed or did not point at youtube.com
    #[error("Invalid YouTube URL")]
    InvalidYouTubeUrl { value: String },
}

/// Errors returned by [`CommandClient`](crate::CommandClient)
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input rejected before sending
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend answered with a non-success status, or could not be reached
    ///
    /// `message` is the user-facing description of the failed action and
    /// `reason` carries the status line or transport error.
    #[error("{message} ({reason})")]
    CommandFailed {
        endpoint: Endpoint,
        message: String,
        status: Option<u16>,
        reason: String,
    },

    /// The backend answered successfully but the body could not be decoded
    #[error("Invalid response from {endpoint}: {reason}")]
    Protocol { endpoint: Endpoint, reason: String },

    /// Client configuration was rejected
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    /// HTTP status of a failed command, when the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::CommandFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// True when the error was raised before any request was issued
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;
