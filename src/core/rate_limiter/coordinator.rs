//! Shared key namespace and store routing
//!
//! Keys carry no service identity, so the gateway and every backend service
//! pointed at the same store charge the same counter for a principal.

use super::types::CounterKey;
use crate::storage::CounterStore;
use crate::utils::error::{GatewayError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Routes counter operations to the shared store
#[derive(Clone)]
pub struct DistributedCoordinator {
    store: Arc<dyn CounterStore>,
    key_prefix: String,
    ttl_grace_seconds: u64,
    store_timeout: Duration,
}

impl std::fmt::Debug for DistributedCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedCoordinator")
            .field("backend", &self.store.backend_name())
            .field("key_prefix", &self.key_prefix)
            .field("ttl_grace_seconds", &self.ttl_grace_seconds)
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

impl DistributedCoordinator {
    pub fn new(store: Arc<dyn CounterStore>, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
            ttl_grace_seconds: crate::config::default_ttl_grace(),
            store_timeout: Duration::from_millis(crate::config::default_store_timeout_ms()),
        }
    }

    pub fn with_ttl_grace(mut self, seconds: u64) -> Self {
        self.ttl_grace_seconds = seconds;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Rendered store key
    pub fn key_for(&self, key: &CounterKey) -> String {
        key.render(&self.key_prefix)
    }

    /// Increment the counter for `key`, creating it with TTL window + grace
    pub async fn increment(&self, key: &CounterKey) -> Result<u64> {
        let rendered = self.key_for(key);
        let ttl = key.window_seconds.saturating_add(self.ttl_grace_seconds);
        self.bounded(self.store.increment_and_get(&rendered, ttl))
            .await
    }

    /// Current count for `key` without changing it
    pub async fn read(&self, key: &CounterKey) -> Result<u64> {
        let rendered = self.key_for(key);
        self.bounded(self.store.read(&rendered)).await
    }

    pub async fn reset(&self, key: &CounterKey) -> Result<()> {
        let rendered = self.key_for(key);
        self.bounded(self.store.reset(&rendered)).await
    }

    /// Store reachability, bounded by the same timeout as counting
    pub async fn health_check(&self) -> Result<()> {
        self.bounded(self.store.health_check()).await
    }

    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.store
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::store_unavailable(format!(
                "{} store did not answer within {}ms",
                self.store.backend_name(),
                self.store_timeout.as_millis()
            ))),
        }
    }
}
