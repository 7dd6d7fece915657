//! Main gateway configuration

use super::*;
use crate::utils::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Counter store configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Overload detection configuration
    #[serde(default)]
    pub degradation: DegradationConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("GATEWAY_HOST") {
            debug!("Overriding server host from environment");
            self.server.host = host;
        }
        if let Some(port) = lookup("GATEWAY_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| GatewayError::config(format!("Invalid GATEWAY_PORT: {}", e)))?;
        }
        if let Some(url) = lookup("REDIS_URL") {
            debug!("Overriding Redis URL from environment");
            self.storage.redis.url = url;
        }
        if let Some(backend) = lookup("RATE_LIMIT_STORE_BACKEND") {
            self.storage.backend = backend.parse().map_err(|e: String| {
                GatewayError::config(format!("Invalid RATE_LIMIT_STORE_BACKEND: {}", e))
            })?;
        }
        Ok(())
    }
}
