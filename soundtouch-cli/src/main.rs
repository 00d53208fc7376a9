use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use soundtouch_api::ClientConfig;
use soundtouch_session::logging::{self, LoggingMode};
use soundtouch_session::{SessionConfig, SessionCoordinator};
use soundtouch_stream::StreamConfig;
use tracing::info;

pub mod observer;
pub mod repl;

use observer::TerminalObserver;

/// Terminal remote for SoundTouch speakers
///
/// Talks to the remote backend's HTTP API for commands and listens on its
/// WebSocket for now-playing and volume updates of the selected device.
#[derive(Parser, Debug)]
#[command(name = "soundtouch")]
#[command(about = "Control SoundTouch speakers through the remote backend")]
#[command(version)]
pub struct Args {
    /// Backend base URL
    #[arg(short, long, default_value = "http://localhost:3000")]
    pub backend: String,

    /// Live channel endpoint; derived from the backend URL when omitted
    #[arg(long)]
    pub ws_endpoint: Option<String>,

    /// Skip discovery on start
    #[arg(long)]
    pub no_discover: bool,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "10")]
    pub timeout: u64,

    /// Log filter (error, warn, info, debug, trace or full directives)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Logging mode (silent, development, debug)
    #[arg(long, default_value = "development")]
    pub log_mode: LoggingMode,
}

impl Args {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<()> {
        if self.timeout == 0 {
            return Err(anyhow::anyhow!("Timeout must be positive"));
        }
        if self.backend.trim().is_empty() {
            return Err(anyhow::anyhow!("Backend URL must not be empty"));
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments and environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub session: SessionConfig,
    pub discover_on_start: bool,
    pub log_level: String,
    pub log_mode: LoggingMode,
}

impl TryFrom<Args> for Config {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self> {
        args.validate()?;

        let timeout = Duration::from_secs(args.timeout);
        let client = ClientConfig::new()
            .with_base_url(&args.backend)
            .with_timeouts(timeout.min(Duration::from_secs(5)), timeout);
        let stream = match args.ws_endpoint {
            Some(endpoint) => StreamConfig::new().with_endpoint(endpoint),
            None => StreamConfig::from_base_url(&args.backend)
                .context("Cannot derive the live channel endpoint from --backend")?,
        };

        let session = SessionConfig::new().with_client(client).with_stream(stream);
        session.validate().context("Invalid backend configuration")?;

        Ok(Self {
            session,
            discover_on_start: !args.no_discover,
            log_level: args.log_level,
            log_mode: args.log_mode,
        })
    }
}

impl Config {
    /// Create configuration from command line arguments and environment variables
    pub fn from_env() -> Result<Self> {
        let mut args = Args::parse();

        if let Ok(backend) = std::env::var("SOUNDTOUCH_BACKEND") {
            args.backend = backend;
        }

        if let Ok(endpoint) = std::env::var("SOUNDTOUCH_WS_ENDPOINT") {
            args.ws_endpoint = Some(endpoint);
        }

        if let Ok(timeout) = std::env::var("SOUNDTOUCH_TIMEOUT") {
            args.timeout = timeout
                .parse()
                .context("Invalid SOUNDTOUCH_TIMEOUT environment variable")?;
        }

        if let Ok(mode) = std::env::var("SOUNDTOUCH_LOG_MODE") {
            args.log_mode = mode
                .parse()
                .context("Invalid SOUNDTOUCH_LOG_MODE environment variable")?;
        }

        if std::env::var("SOUNDTOUCH_NO_DISCOVER").is_ok() {
            args.no_discover = true;
        }

        Config::try_from(args)
    }

    pub fn print_summary(&self) {
        info!("Configuration:");
        info!("  Backend: {}", self.session.client.base_url);
        info!("  Live channel: {}", self.session.stream.endpoint);
        info!("  Request timeout: {}s", self.session.client.request_timeout.as_secs());
        info!("  Discover on start: {}", self.discover_on_start);
    }
}

fn print_env_help() {
    println!("Environment Variables:");
    println!("  SOUNDTOUCH_BACKEND       Backend base URL (default: http://localhost:3000)");
    println!("  SOUNDTOUCH_WS_ENDPOINT   Live channel endpoint (default: <backend>/ws)");
    println!("  SOUNDTOUCH_TIMEOUT       Request timeout in seconds (default: 10)");
    println!("  SOUNDTOUCH_NO_DISCOVER   Skip discovery on start (set to enable)");
    println!("  SOUNDTOUCH_LOG           Log filter, overrides --log-level");
    println!("  SOUNDTOUCH_LOG_MODE      silent, development or debug");
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            print_env_help();
            std::process::exit(1);
        }
    };

    logging::init_logging(config.log_mode, Some(&config.log_level))
        .context("Failed to initialize logging")?;
    config.print_summary();

    let observer = Arc::new(TerminalObserver::new());
    let mut session = SessionCoordinator::new(config.session.clone(), observer)
        .context("Failed to create session")?;

    println!("SoundTouch remote. Type 'help' for commands.");
    if config.discover_on_start {
        // The outcome is printed by the observer
        let _ = session.discover().await;
    }

    let result = repl::run(&mut session).await;
    session.shutdown().await;
    result
}
