//! Counter store configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Which counter store backs the rate limiter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local counters, single instance only
    #[default]
    Memory,
    /// Shared Redis-compatible store
    Redis,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "redis" => Ok(StoreBackend::Redis),
            other => Err(format!("Unknown store backend: {}", other)),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Redis configuration
    #[serde(default)]
    pub redis: RedisConfig,
    /// Purge interval for expired in-memory counters, in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            redis: RedisConfig::default(),
            cleanup_interval: default_cleanup_interval(),
        }
    }
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis URL
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
    /// Start with in-memory counters when Redis cannot be reached at startup
    #[serde(default)]
    pub fallback_to_memory: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            connection_timeout: default_connection_timeout(),
            fallback_to_memory: false,
        }
    }
}
