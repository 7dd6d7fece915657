//! Rate limit decisions
//!
//! Every gate (HTTP, WebSocket, agent execution) goes through
//! [`RateLimitEnforcer::check`], so counting and policy selection happen in
//! exactly one place.

use super::clock::Clock;
use super::coordinator::DistributedCoordinator;
use super::degradation::DegradationController;
use super::policy::TierPolicyResolver;
use super::types::{CounterKey, Decision, FailureMode, Policy, Principal, Scope};
use crate::config::{DegradationConfig, RateLimitConfig};
use crate::monitoring::RateLimitMetrics;
use crate::storage::CounterStore;
use crate::utils::error::{GatewayError, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Read-only view of a principal's usage in the current window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub principal_id: String,
    pub scope: String,
    pub count: u64,
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: u64,
    pub window_seconds: u64,
}

/// One counter increment measured against one policy
#[derive(Debug, Clone, Copy)]
struct Counted<'a> {
    policy: &'a Policy,
    count: u64,
    reset_at: u64,
}

impl Counted<'_> {
    fn is_denied(&self) -> bool {
        self.count > self.policy.ceiling()
    }

    fn remaining(&self) -> u64 {
        self.policy.limit.saturating_sub(self.count)
    }

    /// Whether this outcome is tighter than `other`
    fn binds_over(&self, other: &Counted<'_>) -> bool {
        match (self.is_denied(), other.is_denied()) {
            (true, false) => true,
            (false, true) => false,
            // Both denied: the request can only pass after the later reset.
            (true, true) => self.reset_at > other.reset_at,
            (false, false) => self.remaining() < other.remaining(),
        }
    }

    fn decide(&self, now: u64, emergency: bool) -> Decision {
        if self.is_denied() {
            Decision::denied(self.policy, self.reset_at, now, emergency)
        } else {
            Decision::allowed(self.policy, self.count, self.reset_at, emergency)
        }
    }
}

/// Core decision function shared by all gates
#[derive(Debug)]
pub struct RateLimitEnforcer {
    enabled: bool,
    resolver: TierPolicyResolver,
    coordinator: DistributedCoordinator,
    degradation: Arc<DegradationController>,
    clock: Arc<dyn Clock>,
    metrics: RateLimitMetrics,
}

impl RateLimitEnforcer {
    pub fn new(
        resolver: TierPolicyResolver,
        coordinator: DistributedCoordinator,
        degradation: Arc<DegradationController>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            enabled: true,
            resolver,
            coordinator,
            degradation,
            clock,
            metrics: RateLimitMetrics::disabled(),
        }
    }

    /// Wire the enforcer from configuration
    pub fn from_config(
        rate_limit: &RateLimitConfig,
        degradation: &DegradationConfig,
        store: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
        metrics: RateLimitMetrics,
    ) -> Result<Self> {
        let resolver = TierPolicyResolver::new(rate_limit)?;
        let coordinator = DistributedCoordinator::new(store, rate_limit.key_prefix.clone())
            .with_ttl_grace(rate_limit.ttl_grace_seconds)
            .with_store_timeout(Duration::from_millis(rate_limit.store_timeout_ms));
        let controller = Arc::new(
            DegradationController::new(degradation.clone(), Arc::clone(&clock))
                .with_metrics(metrics.clone()),
        );

        let mut enforcer = Self::new(resolver, coordinator, controller, clock).with_metrics(metrics);
        enforcer.enabled = rate_limit.enabled;
        Ok(enforcer)
    }

    pub fn with_metrics(mut self, metrics: RateLimitMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn resolver(&self) -> &TierPolicyResolver {
        &self.resolver
    }

    pub fn coordinator(&self) -> &DistributedCoordinator {
        &self.coordinator
    }

    pub fn degradation(&self) -> &Arc<DegradationController> {
        &self.degradation
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Decide whether one unit of work for `principal` may proceed in `scope`
    ///
    /// Denials are `Ok` decisions. Errors mean no decision could be made: the
    /// scope is unknown, or the store failed under a fail-closed policy.
    pub async fn check(&self, principal: &Principal, scope: &Scope) -> Result<Decision> {
        let tier_policy = match self.resolver.resolve(principal, scope) {
            Ok(policy) => policy,
            Err(e) => {
                error!(
                    principal = %principal.id,
                    scope = %scope,
                    "Rate limit check for unregistered scope, rejecting"
                );
                self.metrics.record_unknown_scope();
                return Err(e);
            }
        };

        let now = self.clock.now_secs();
        if !self.enabled {
            let reset_at = tier_policy.window_start(now) + tier_policy.window_seconds;
            return Ok(Decision::unmetered(tier_policy, reset_at));
        }

        let tier = match self.count(principal, tier_policy, now).await {
            Ok(counted) => counted,
            Err(e) => return self.on_store_failure(principal, tier_policy, now, e),
        };

        // While degraded both ceilings apply; whichever is tighter decides.
        let emergency_policy;
        let emergency = if self.degradation.is_active() {
            emergency_policy = self.degradation.emergency_policy(tier_policy);
            let counted = if emergency_policy.window_seconds == tier_policy.window_seconds {
                Counted {
                    policy: &emergency_policy,
                    count: tier.count,
                    reset_at: tier.reset_at,
                }
            } else {
                match self.count(principal, &emergency_policy, now).await {
                    Ok(counted) => counted,
                    Err(e) => return self.on_store_failure(principal, &emergency_policy, now, e),
                }
            };
            Some(counted)
        } else {
            None
        };

        let (binding, is_emergency) = match &emergency {
            Some(e) if e.binds_over(&tier) => (e, true),
            _ => (&tier, false),
        };
        let decision = binding.decide(now, is_emergency);
        let count = binding.count;

        self.degradation
            .record_decision(&principal.id, !tier.is_denied());
        self.metrics
            .record_decision(scope, principal.tier, &decision);

        if decision.allowed {
            debug!(
                principal = %principal.id,
                scope = %scope,
                count,
                remaining = decision.remaining,
                "Rate limit check passed"
            );
        } else {
            warn!(
                principal = %principal.id,
                tier = %principal.tier,
                scope = %scope,
                count,
                emergency = decision.emergency,
                retry_after = ?decision.retry_after,
                "Rate limit exceeded"
            );
        }

        Ok(decision)
    }

    /// Charge one request against `policy`'s current window
    async fn count<'p>(
        &self,
        principal: &Principal,
        policy: &'p Policy,
        now: u64,
    ) -> Result<Counted<'p>> {
        let key = CounterKey::for_window(principal, policy, now);
        let count = self.coordinator.increment(&key).await?;
        Ok(Counted {
            policy,
            count,
            reset_at: key.window_start + policy.window_seconds,
        })
    }

    fn on_store_failure(
        &self,
        principal: &Principal,
        policy: &Policy,
        now: u64,
        err: GatewayError,
    ) -> Result<Decision> {
        let reset_at = policy.window_start(now) + policy.window_seconds;
        match policy.failure_mode {
            FailureMode::FailOpen => {
                warn!(
                    principal = %principal.id,
                    scope = %policy.scope,
                    error = %err,
                    "Counter store failed, admitting request unmetered"
                );
                self.metrics.record_store_failure(&policy.scope, "fail_open");
                Ok(Decision::unmetered(policy, reset_at))
            }
            FailureMode::FailClosed => {
                error!(
                    principal = %principal.id,
                    scope = %policy.scope,
                    error = %err,
                    "Counter store failed, rejecting request"
                );
                self.metrics
                    .record_store_failure(&policy.scope, "fail_closed");
                Err(match err {
                    GatewayError::StoreUnavailable(_) => err,
                    other => GatewayError::store_unavailable(other.to_string()),
                })
            }
        }
    }

    /// Usage in the current window of the tier policy, without counting
    pub async fn usage(&self, principal: &Principal, scope: &Scope) -> Result<Usage> {
        let policy = self.resolver.resolve(principal, scope)?;
        let key = CounterKey::for_window(principal, policy, self.clock.now_secs());
        let count = self.coordinator.read(&key).await?;

        Ok(Usage {
            principal_id: principal.id.clone(),
            scope: scope.to_string(),
            count,
            limit: policy.limit,
            remaining: policy.limit.saturating_sub(count),
            reset_at: key.window_start + policy.window_seconds,
            window_seconds: policy.window_seconds,
        })
    }

    /// Clear the current-window counter of the tier policy
    pub async fn reset_usage(&self, principal: &Principal, scope: &Scope) -> Result<()> {
        let policy = self.resolver.resolve(principal, scope)?;
        let key = CounterKey::for_window(principal, policy, self.clock.now_secs());
        self.coordinator.reset(&key).await
    }
}
