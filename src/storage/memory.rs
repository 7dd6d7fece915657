//! In-memory counter store

use super::counter::CounterStore;
use crate::core::rate_limiter::clock::Clock;
use crate::utils::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
struct CounterEntry {
    count: u64,
    expires_at: u64,
}

/// Process-local counters with TTL enforced against a [`Clock`]
///
/// Suitable for single-instance deployments and tests. Counts are not shared
/// between processes.
#[derive(Debug)]
pub struct InMemoryCounterStore {
    counters: DashMap<String, CounterEntry>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCounterStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            counters: DashMap::new(),
            clock,
        }
    }

    /// Number of live and not yet purged keys
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Drop expired counters, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_secs();
        let before = self.counters.len();
        self.counters.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.counters.len())
    }

    /// Start the periodic purge task
    pub fn start_cleanup_task(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = store.purge_expired();
                        if removed > 0 {
                            debug!("Purged {} expired rate limit counters", removed);
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("Stopping in-memory counter cleanup task");
                            break;
                        }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment_and_get(&self, key: &str, ttl_seconds: u64) -> Result<u64> {
        let now = self.clock.now_secs();
        let fresh = CounterEntry {
            count: 0,
            expires_at: now.saturating_add(ttl_seconds),
        };

        // The entry guard holds the shard lock, making the update atomic.
        let mut entry = self.counters.entry(key.to_string()).or_insert(fresh);
        if entry.expires_at <= now {
            *entry = fresh;
        }
        entry.count += 1;
        Ok(entry.count)
    }

    async fn read(&self, key: &str) -> Result<u64> {
        let now = self.clock.now_secs();
        Ok(self
            .counters
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.count)
            .unwrap_or(0))
    }

    async fn reset(&self, key: &str) -> Result<()> {
        self.counters.remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
