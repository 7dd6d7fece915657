//! Redis-backed counter store
//!
//! Counters live in a shared Redis-compatible store so every gateway
//! instance and backend service observes the same usage.

mod counter;
mod pool;

pub use counter::RedisCounterStore;
pub use pool::RedisPool;
