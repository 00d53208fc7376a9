//! Error types for the soundtouch-stream crate.

/// Errors raised by the live channel.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A pushed frame was not a JSON object
    #[error("Malformed push message: {0}")]
    Protocol(String),

    /// The WebSocket handshake failed or timed out
    #[error("Failed to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Convenience type alias for Results using StreamError.
pub type Result<T> = std::result::Result<T, StreamError>;
