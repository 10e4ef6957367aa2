//! Logging setup
//!
//! Both binaries install one `tracing-subscriber` formatter at startup. The
//! filter comes from `RUST_LOG` when set, otherwise from the configured level.

use crate::config::models::logging::{LogFormat, LoggingConfig};
use crate::utils::error::{MetricsError, Result};
use tracing_subscriber::EnvFilter;

/// Build the level filter for the given configuration
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| MetricsError::config(format!("Invalid log level '{}': {}", config.level, e))),
    }
}

/// Install the global tracing subscriber
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_thread_ids(false);

    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };

    installed.map_err(|e| MetricsError::internal(format!("Failed to install tracing subscriber: {}", e)))
}
