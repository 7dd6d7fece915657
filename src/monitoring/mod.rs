//! Monitoring and observability

pub mod metrics;

pub use metrics::RateLimitMetrics;
