//! Common test utilities for ratelimit-gateway
//!
//! Every fixture runs against an in-memory counter store and a
//! `ManualClock` so window boundaries are deterministic.

pub mod fixtures;

pub use fixtures::{PrincipalFactory, TestGateway};

/// Aligned to a 60s boundary plus 10s
pub const NOW: u64 = 1_000_030;
