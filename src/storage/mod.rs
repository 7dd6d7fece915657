//! Storage layer for the Gateway
//!
//! Rate limit counters live behind the [`CounterStore`] trait with a Redis
//! backend for multi-instance deployments and an in-memory one for single
//! instances and tests.

pub mod counter;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use counter::CounterStore;
pub use memory::InMemoryCounterStore;

use crate::config::{StorageConfig, StoreBackend};
use crate::core::rate_limiter::clock::Clock;
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// Build the configured counter store
///
/// The in-memory store gets a purge task bound to `shutdown`.
pub async fn build_counter_store(
    config: &StorageConfig,
    clock: Arc<dyn Clock>,
    shutdown: watch::Receiver<bool>,
) -> Result<Arc<dyn CounterStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(memory_store(config, clock, shutdown)),
        StoreBackend::Redis => redis_store(config, clock, shutdown).await,
    }
}

fn memory_store(
    config: &StorageConfig,
    clock: Arc<dyn Clock>,
    shutdown: watch::Receiver<bool>,
) -> Arc<dyn CounterStore> {
    info!("Using in-memory rate limit counters");
    let store = Arc::new(InMemoryCounterStore::new(clock));
    store.start_cleanup_task(Duration::from_secs(config.cleanup_interval), shutdown);
    store
}

#[cfg(feature = "redis")]
async fn redis_store(
    config: &StorageConfig,
    clock: Arc<dyn Clock>,
    shutdown: watch::Receiver<bool>,
) -> Result<Arc<dyn CounterStore>> {
    match self::redis::RedisCounterStore::connect(&config.redis).await {
        Ok(store) => {
            info!("Using Redis rate limit counters");
            Ok(Arc::new(store))
        }
        Err(e) if config.redis.fallback_to_memory => {
            tracing::warn!(
                "Redis unavailable ({}), falling back to in-memory counters; limits are no longer shared between instances",
                e
            );
            Ok(memory_store(config, clock, shutdown))
        }
        Err(e) => Err(e),
    }
}

#[cfg(not(feature = "redis"))]
async fn redis_store(
    _config: &StorageConfig,
    _clock: Arc<dyn Clock>,
    _shutdown: watch::Receiver<bool>,
) -> Result<Arc<dyn CounterStore>> {
    Err(crate::utils::error::GatewayError::config(
        "Redis backend requested but the redis feature is disabled",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rate_limiter::clock::ManualClock;

    #[tokio::test]
    async fn test_build_memory_store() {
        let (_tx, rx) = watch::channel(false);
        let store = build_counter_store(
            &StorageConfig::default(),
            Arc::new(ManualClock::new(0)),
            rx,
        )
        .await
        .unwrap();
        assert_eq!(store.backend_name(), "memory");
    }

    #[cfg(feature = "redis")]
    #[tokio::test]
    async fn test_unreachable_redis_falls_back_when_allowed() {
        use crate::config::RedisConfig;

        let (_tx, rx) = watch::channel(false);
        let config = StorageConfig {
            backend: StoreBackend::Redis,
            redis: RedisConfig {
                url: "redis://127.0.0.1:1".to_string(),
                connection_timeout: 1,
                fallback_to_memory: true,
            },
            ..Default::default()
        };

        let store = build_counter_store(&config, Arc::new(ManualClock::new(0)), rx)
            .await
            .unwrap();
        assert_eq!(store.backend_name(), "memory");
    }
}
