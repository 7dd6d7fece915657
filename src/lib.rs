//! # ratelimit-gateway
//!
//! A distributed, multi-tier rate-limiting gateway for HTTP API calls,
//! WebSocket messages and agent-execution requests.
//!
//! ## Features
//!
//! - **Tiered quotas**: free, pro and enterprise policies per scope
//! - **Shared counters**: fixed windows in Redis, so every instance enforces
//!   one budget per principal
//! - **Graceful degradation**: a global emergency ceiling when the denial
//!   ratio stays high across many principals
//! - **Two gates**: actix-web middleware for HTTP, a warn-then-close state
//!   machine for WebSocket connections
//!
//! ## Embedding the enforcer
//!
//! ```rust,no_run
//! use ratelimit_gateway::config::Config;
//! use ratelimit_gateway::core::rate_limiter::{Principal, RateLimitEnforcer, Scope, SystemClock, Tier};
//! use ratelimit_gateway::monitoring::RateLimitMetrics;
//! use ratelimit_gateway::storage::InMemoryCounterStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let clock = Arc::new(SystemClock);
//!     let store = Arc::new(InMemoryCounterStore::new(clock.clone()));
//!     let enforcer = RateLimitEnforcer::from_config(
//!         config.rate_limit(),
//!         config.degradation(),
//!         store,
//!         clock,
//!         RateLimitMetrics::disabled(),
//!     )?;
//!
//!     let decision = enforcer
//!         .check(&Principal::new("user-1", Tier::Free), &Scope::chat_message())
//!         .await?;
//!     println!("allowed={} remaining={}", decision.allowed, decision.remaining);
//!     Ok(())
//! }
//! ```
//!
//! ## Gateway Mode
//!
//! ```rust,no_run
//! use ratelimit_gateway::{Config, Gateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/gateway.yaml").await?;
//!     let gateway = Gateway::new(config).await?;
//!     gateway.run().await?;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod monitoring;
pub mod server;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use utils::error::{GatewayError, Result};

pub use core::rate_limiter::{
    Decision, DegradationState, Policy, Principal, RateLimitEnforcer, Scope, Tier,
};

use tracing::info;

/// A rate limit gateway instance
pub struct Gateway {
    config: Config,
    server: server::HttpServer,
}

impl Gateway {
    /// Create a new gateway instance
    pub async fn new(config: Config) -> Result<Self> {
        info!("Creating new gateway instance");

        let server = server::HttpServer::new(&config).await?;

        Ok(Self { config, server })
    }

    /// Run the gateway server
    pub async fn run(self) -> Result<()> {
        info!("Starting rate limit gateway");
        info!("Configuration: {:#?}", self.config);

        self.server.start().await?;

        Ok(())
    }
}

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Gateway build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Version number
    pub version: &'static str,
    /// Build timestamp (unix seconds)
    pub build_time: &'static str,
    /// Git commit hash
    pub git_hash: &'static str,
    /// Rust version
    pub rust_version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: VERSION,
            build_time: option_env!("BUILD_TIME").unwrap_or("unknown"),
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
            rust_version: option_env!("RUST_VERSION").unwrap_or("unknown"),
        }
    }
}

/// Build information captured by the build script
pub fn build_info() -> BuildInfo {
    BuildInfo::default()
}
