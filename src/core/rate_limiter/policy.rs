//! Tier policy resolution

use super::types::{Policy, Principal, Scope, Tier};
use crate::config::{RateLimitConfig, Validate};
use crate::utils::error::{GatewayError, Result};
use std::collections::HashMap;
use tracing::debug;

/// Maps (tier, scope) to a [`Policy`]
///
/// The table is built once from configuration and never changes, so lookups
/// are plain reads.
#[derive(Debug, Clone)]
pub struct TierPolicyResolver {
    policies: HashMap<Scope, [Policy; 3]>,
}

impl TierPolicyResolver {
    /// Build the table, rejecting configurations that break tier ordering
    pub fn new(config: &RateLimitConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| GatewayError::config(format!("Invalid rate limit policies: {}", e)))?;

        let mut policies = HashMap::with_capacity(config.scopes.len());
        for scope_config in &config.scopes {
            let build = |tier: Tier| {
                let quota = config.effective_policy(scope_config, tier);
                Policy {
                    scope: scope_config.scope.clone(),
                    tier,
                    limit: quota.limit,
                    window_seconds: quota.window_seconds,
                    burst_allowance: quota.burst_allowance,
                    failure_mode: scope_config.failure_mode,
                }
            };
            policies.insert(
                scope_config.scope.clone(),
                [build(Tier::Free), build(Tier::Pro), build(Tier::Enterprise)],
            );
        }

        debug!("Loaded rate limit policies for {} scopes", policies.len());
        Ok(Self { policies })
    }

    /// Policy for `principal` within `scope`
    pub fn resolve(&self, principal: &Principal, scope: &Scope) -> Result<&Policy> {
        self.resolve_tier(principal.tier, scope)
    }

    pub fn resolve_tier(&self, tier: Tier, scope: &Scope) -> Result<&Policy> {
        self.policies
            .get(scope)
            .map(|by_tier| &by_tier[tier.index()])
            .ok_or_else(|| GatewayError::unknown_scope(scope.to_string()))
    }

    pub fn contains(&self, scope: &Scope) -> bool {
        self.policies.contains_key(scope)
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.policies.keys()
    }
}
