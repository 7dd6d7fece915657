//! Redis connection management

use crate::config::RedisConfig;
use crate::utils::error::{GatewayError, Result};
use redis::Client;
use redis::aio::ConnectionManager;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Shared multiplexed Redis connection
///
/// `ConnectionManager` reconnects on its own after the server goes away, so
/// a transient outage only fails the calls made while it lasts.
#[derive(Clone)]
pub struct RedisPool {
    connection: ConnectionManager,
    config: RedisConfig,
}

impl fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisPool")
            .field("url", &Self::sanitize_url(&self.config.url))
            .finish()
    }
}

impl RedisPool {
    /// Connect to Redis
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        info!("Creating Redis connection pool");
        debug!("Redis URL: {}", Self::sanitize_url(&config.url));

        let client = Client::open(config.url.as_str()).map_err(GatewayError::Redis)?;

        let timeout = Duration::from_secs(config.connection_timeout);
        let connection = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                GatewayError::store_unavailable(format!(
                    "Timed out connecting to Redis at {}",
                    Self::sanitize_url(&config.url)
                ))
            })?
            .map_err(GatewayError::Redis)?;

        info!("Redis connection pool created successfully");
        Ok(Self {
            connection,
            config: config.clone(),
        })
    }

    /// Get a handle on the shared connection
    pub fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        debug!("Performing Redis health check");
        let mut conn = self.connection();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| GatewayError::store_unavailable(e.to_string()))?;
        Ok(())
    }

    /// Sanitize Redis URL for logging (hide password)
    pub(crate) fn sanitize_url(url: &str) -> String {
        if let Ok(parsed) = url::Url::parse(url) {
            let mut sanitized = parsed.clone();
            if sanitized.password().is_some() {
                let _ = sanitized.set_password(Some("***"));
            }
            sanitized.to_string()
        } else {
            "invalid_url".to_string()
        }
    }
}
