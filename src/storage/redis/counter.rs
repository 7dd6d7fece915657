//! Counter store on top of Redis

use super::pool::RedisPool;
use crate::config::RedisConfig;
use crate::storage::counter::CounterStore;
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use redis::{AsyncCommands, Script};

/// Increment and, for a freshly created key only, set its expiry.
///
/// Running both in one script keeps a crash between the two commands from
/// leaving a counter without a TTL.
pub(crate) const INCREMENT_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

/// Counter store shared by every service pointed at the same Redis
#[derive(Debug, Clone)]
pub struct RedisCounterStore {
    pool: RedisPool,
    increment: Script,
}

impl RedisCounterStore {
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            increment: Script::new(INCREMENT_SCRIPT),
        }
    }

    /// Connect using the storage configuration
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        Ok(Self::new(RedisPool::new(config).await?))
    }
}

fn unavailable(err: redis::RedisError) -> GatewayError {
    GatewayError::store_unavailable(err.to_string())
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment_and_get(&self, key: &str, ttl_seconds: u64) -> Result<u64> {
        let mut conn = self.pool.connection();
        let count: i64 = self
            .increment
            .key(key)
            .arg(ttl_seconds)
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(count.max(0) as u64)
    }

    async fn read(&self, key: &str) -> Result<u64> {
        let mut conn = self.pool.connection();
        let count: Option<i64> = conn.get(key).await.map_err(unavailable)?;
        Ok(count.unwrap_or(0).max(0) as u64)
    }

    async fn reset(&self, key: &str) -> Result<()> {
        let mut conn = self.pool.connection();
        let _: () = conn.del(key).await.map_err(unavailable)?;
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        self.pool.health_check().await
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
