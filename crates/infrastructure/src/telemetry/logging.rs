//! `tracing` subscriber setup

use thiserror::Error;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;

/// Errors during logging setup
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber is already installed or the filter is invalid
    #[error("Failed to initialize logging: {0}")]
    Init(String),
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "info".to_string(),
        }
    }
}

impl From<&ServerConfig> for LoggingConfig {
    fn from(server: &ServerConfig) -> Self {
        Self {
            format: if server.json_logs() {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            filter: server.log_filter.clone(),
        }
    }
}

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over the configured filter.
///
/// # Example
///
/// ```ignore
/// use infrastructure::telemetry::{LoggingConfig, init_logging};
///
/// init_logging(&LoggingConfig::from(&config.server))?;
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| TelemetryError::Init(format!("invalid log filter: {e}")))?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
            .try_init(),
    };

    result.map_err(|e| TelemetryError::Init(e.to_string()))?;

    info!(format = ?config.format, "Logging initialized");
    Ok(())
}
