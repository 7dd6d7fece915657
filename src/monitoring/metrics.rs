//! Rate limiting metrics
//!
//! Prometheus counters when the `metrics` feature is enabled, no-ops otherwise.
//! Labels only carry scopes, tiers and outcomes so cardinality stays bounded.

use crate::core::rate_limiter::types::{Decision, Scope, Tier};
use crate::utils::error::Result;

#[cfg(feature = "metrics")]
use crate::utils::error::GatewayError;
#[cfg(feature = "metrics")]
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
#[cfg(feature = "metrics")]
use std::sync::Arc;

#[cfg(feature = "metrics")]
struct Collectors {
    registry: Registry,
    decisions: IntCounterVec,
    store_failures: IntCounterVec,
    unknown_scope: IntCounter,
    degradation_active: IntGauge,
}

/// Handle on the rate limiter metrics
///
/// Cheap to clone; clones update the same collectors.
#[derive(Clone, Default)]
pub struct RateLimitMetrics {
    #[cfg(feature = "metrics")]
    inner: Option<Arc<Collectors>>,
}

impl std::fmt::Debug for RateLimitMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitMetrics")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl RateLimitMetrics {
    /// Metrics that record nothing
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        #[cfg(feature = "metrics")]
        return self.inner.is_some();
        #[cfg(not(feature = "metrics"))]
        false
    }

    /// Register the collectors in a fresh registry
    #[cfg(feature = "metrics")]
    pub fn new() -> Result<Self> {
        fn metric_err(e: prometheus::Error) -> GatewayError {
            GatewayError::internal(format!("Failed to register metric: {}", e))
        }

        let registry = Registry::new();
        let decisions = IntCounterVec::new(
            Opts::new(
                "ratelimit_decisions_total",
                "Rate limit decisions by scope, tier and outcome",
            ),
            &["scope", "tier", "outcome"],
        )
        .map_err(metric_err)?;
        let store_failures = IntCounterVec::new(
            Opts::new(
                "ratelimit_store_failures_total",
                "Counter store failures by scope and failure mode",
            ),
            &["scope", "mode"],
        )
        .map_err(metric_err)?;
        let unknown_scope = IntCounter::new(
            "ratelimit_unknown_scope_total",
            "Requests rejected because their scope has no policy",
        )
        .map_err(metric_err)?;
        let degradation_active = IntGauge::new(
            "ratelimit_degradation_active",
            "1 while the emergency policy is in force",
        )
        .map_err(metric_err)?;

        registry
            .register(Box::new(decisions.clone()))
            .map_err(metric_err)?;
        registry
            .register(Box::new(store_failures.clone()))
            .map_err(metric_err)?;
        registry
            .register(Box::new(unknown_scope.clone()))
            .map_err(metric_err)?;
        registry
            .register(Box::new(degradation_active.clone()))
            .map_err(metric_err)?;

        Ok(Self {
            inner: Some(Arc::new(Collectors {
                registry,
                decisions,
                store_failures,
                unknown_scope,
                degradation_active,
            })),
        })
    }

    #[cfg(not(feature = "metrics"))]
    pub fn new() -> Result<Self> {
        Ok(Self::default())
    }

    pub fn record_decision(&self, scope: &Scope, tier: Tier, decision: &Decision) {
        #[cfg(feature = "metrics")]
        if let Some(inner) = &self.inner {
            let outcome = match (decision.allowed, decision.emergency) {
                (true, _) => "allowed",
                (false, false) => "denied",
                (false, true) => "denied_emergency",
            };
            inner
                .decisions
                .with_label_values(&[scope.to_string().as_str(), tier.as_str(), outcome])
                .inc();
        }
        #[cfg(not(feature = "metrics"))]
        let _ = (scope, tier, decision);
    }

    pub fn record_store_failure(&self, scope: &Scope, mode: &str) {
        #[cfg(feature = "metrics")]
        if let Some(inner) = &self.inner {
            inner
                .store_failures
                .with_label_values(&[scope.to_string().as_str(), mode])
                .inc();
        }
        #[cfg(not(feature = "metrics"))]
        let _ = (scope, mode);
    }

    pub fn record_unknown_scope(&self) {
        #[cfg(feature = "metrics")]
        if let Some(inner) = &self.inner {
            inner.unknown_scope.inc();
        }
    }

    pub fn set_degradation_active(&self, active: bool) {
        #[cfg(feature = "metrics")]
        if let Some(inner) = &self.inner {
            inner.degradation_active.set(i64::from(active));
        }
        #[cfg(not(feature = "metrics"))]
        let _ = active;
    }

    /// Text exposition format, empty when disabled
    pub fn render(&self) -> Result<String> {
        #[cfg(feature = "metrics")]
        if let Some(inner) = &self.inner {
            let mut buffer = String::new();
            TextEncoder::new()
                .encode_utf8(&inner.registry.gather(), &mut buffer)
                .map_err(|e| GatewayError::internal(format!("Failed to encode metrics: {}", e)))?;
            return Ok(buffer);
        }
        Ok(String::new())
    }
}
