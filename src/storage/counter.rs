//! Counter store abstraction
//!
//! Every rate limit decision in every service goes through one of these, so
//! the store is the only place usage is recorded.

use crate::utils::error::Result;
use async_trait::async_trait;

/// Atomic, TTL-bounded counters
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increment `key` and return the new count
    ///
    /// The TTL is set only by the call that creates the key; later increments
    /// never extend it.
    async fn increment_and_get(&self, key: &str, ttl_seconds: u64) -> Result<u64>;

    /// Current count for `key`, or 0 when absent or expired
    async fn read(&self, key: &str) -> Result<u64>;

    /// Remove `key`
    async fn reset(&self, key: &str) -> Result<()>;

    /// Check the backend is reachable
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    /// Short backend name for logs and health output
    fn backend_name(&self) -> &'static str;
}
