//! Configuration data models
//!
//! This module defines all configuration structures used throughout the gateway.

#![allow(missing_docs)]

pub mod degradation;
pub mod gateway;
pub mod logging;
pub mod rate_limit;
pub mod server;
pub mod storage;

// Re-export all configuration types
pub use degradation::*;
pub use gateway::*;
pub use logging::*;
pub use rate_limit::*;
pub use server::*;
pub use storage::*;

/// Default values for configuration
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub fn default_port() -> u16 {
    8000
}

/// Default graceful shutdown timeout in seconds
pub fn default_shutdown_timeout() -> u64 {
    30
}

pub fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

/// Default connection timeout in seconds
pub fn default_connection_timeout() -> u64 {
    5
}

/// Default expired-counter purge interval for the in-memory store
pub fn default_cleanup_interval() -> u64 {
    60
}

pub fn default_key_prefix() -> String {
    "rl".to_string()
}

/// Default budget for a single counter store call
pub fn default_store_timeout_ms() -> u64 {
    50
}

/// Extra lifetime given to a counter after its window ends
pub fn default_ttl_grace() -> u64 {
    5
}

pub fn default_true() -> bool {
    true
}

pub fn default_log_level() -> String {
    "info".to_string()
}
