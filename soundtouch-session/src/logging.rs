//! Logging setup for front-ends
//!
//! Logs always go to stderr so they never interleave with what a terminal
//! front-end prints on stdout.

use std::str::FromStr;

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Environment variable that overrides any configured filter
pub const LOG_ENV: &str = "SOUNDTOUCH_LOG";

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber at all
    Silent,
    /// Compact stderr output at info level
    #[default]
    Development,
    /// Verbose output with source locations
    Debug,
}

impl LoggingMode {
    fn default_filter(&self) -> &'static str {
        match self {
            LoggingMode::Silent => "off",
            LoggingMode::Development => "info",
            LoggingMode::Debug => "debug",
        }
    }
}

impl FromStr for LoggingMode {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "silent" => Ok(LoggingMode::Silent),
            "development" | "dev" => Ok(LoggingMode::Development),
            "debug" => Ok(LoggingMode::Debug),
            other => Err(LoggingError::InvalidMode(other.to_string())),
        }
    }
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Unknown logging mode '{0}' (expected silent, development or debug)")]
    InvalidMode(String),
}

/// Install the global subscriber for `mode`
///
/// The filter is taken from `SOUNDTOUCH_LOG` when set, then from `level`,
/// then from `RUST_LOG`, and finally from the mode's default.
///
/// ```rust,ignore
/// soundtouch_session::logging::init_logging(LoggingMode::Development, Some("soundtouch_stream=debug"))?;
/// ```
pub fn init_logging(mode: LoggingMode, level: Option<&str>) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = create_env_filter(mode, level);
    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => Registry::default()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .with(filter)
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
        LoggingMode::Debug => Registry::default()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
    }
}

fn create_env_filter(mode: LoggingMode, level: Option<&str>) -> EnvFilter {
    if let Ok(directives) = std::env::var(LOG_ENV) {
        return EnvFilter::new(directives);
    }
    if let Some(level) = level {
        return EnvFilter::new(level);
    }
    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        return EnvFilter::new(rust_log);
    }
    EnvFilter::new(mode.default_filter())
}

/// Check if a global subscriber has been installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}
