//! Tracing subscriber setup

use crate::config::LoggingConfig;
use crate::utils::error::{GatewayError, Result};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| GatewayError::config(format!("Invalid log filter '{}': {}", config.level, e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| GatewayError::internal(format!("Failed to install tracing subscriber: {}", e)))
}
