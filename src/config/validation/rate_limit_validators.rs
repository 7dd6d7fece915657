//! Rate limit and degradation validators

use super::trait_def::Validate;
use crate::config::models::*;
use crate::core::rate_limiter::types::Tier;
use std::collections::HashSet;
use tracing::debug;

impl Validate for PolicyConfig {
    fn validate(&self) -> Result<(), String> {
        if self.limit == 0 {
            return Err("Policy limit must be greater than 0".to_string());
        }
        if self.window_seconds == 0 {
            return Err("Policy window_seconds must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Validate for RateLimitConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating rate limit configuration");

        if self.key_prefix.is_empty() || self.key_prefix.chars().any(char::is_whitespace) {
            return Err("Rate limit key_prefix must be non-empty without whitespace".to_string());
        }

        if self.store_timeout_ms == 0 {
            return Err("Rate limit store_timeout_ms must be greater than 0".to_string());
        }

        for tier in Tier::ALL {
            self.tier_defaults
                .get(tier)
                .validate()
                .map_err(|e| format!("Default policy for tier {}: {}", tier, e))?;
        }
        check_monotonic("tier defaults", |tier| *self.tier_defaults.get(tier))?;

        let mut seen = HashSet::new();
        for scope in &self.scopes {
            if !seen.insert(&scope.scope) {
                return Err(format!("Duplicate scope: {}", scope.scope));
            }
            for tier in Tier::ALL {
                if let Some(policy) = scope.overrides.get(tier) {
                    policy
                        .validate()
                        .map_err(|e| format!("Scope {} tier {}: {}", scope.scope, tier, e))?;
                }
            }
            check_monotonic(&scope.scope.to_string(), |tier| {
                self.effective_policy(scope, tier)
            })?;
        }

        if !seen.contains(&self.default_scope) {
            return Err(format!(
                "Default scope {} is not registered",
                self.default_scope
            ));
        }

        for route in &self.routes {
            if !route.prefix.starts_with('/') {
                return Err(format!("Route prefix must start with '/': {}", route.prefix));
            }
            if !seen.contains(&route.scope) {
                return Err(format!(
                    "Route {} refers to unregistered scope {}",
                    route.prefix, route.scope
                ));
            }
        }

        if !seen.contains(&self.websocket.scope) {
            return Err(format!(
                "WebSocket scope {} is not registered",
                self.websocket.scope
            ));
        }

        if self.websocket.close_after_violation_windows == 0 {
            return Err("close_after_violation_windows must be at least 1".to_string());
        }

        Ok(())
    }
}

/// Higher tiers must never receive a smaller limit than lower ones
fn check_monotonic<F>(context: &str, policy_for: F) -> Result<(), String>
where
    F: Fn(Tier) -> PolicyConfig,
{
    for pair in Tier::ALL.windows(2) {
        let (lower, higher) = (pair[0], pair[1]);
        let lower_limit = policy_for(lower).limit;
        let higher_limit = policy_for(higher).limit;
        if higher_limit < lower_limit {
            return Err(format!(
                "{}: tier {} limit {} is below tier {} limit {}",
                context, higher, higher_limit, lower, lower_limit
            ));
        }
    }
    Ok(())
}

impl Validate for DegradationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms == 0 {
            return Err("Degradation tick_interval_ms must be greater than 0".to_string());
        }
        if self.window_ticks == 0 {
            return Err("Degradation window_ticks must be greater than 0".to_string());
        }
        if self.sustain_ticks == 0 {
            return Err("Degradation sustain_ticks must be greater than 0".to_string());
        }
        if !(self.denial_ratio_threshold > 0.0 && self.denial_ratio_threshold <= 1.0) {
            return Err("denial_ratio_threshold must be in (0, 1]".to_string());
        }
        if !(self.recovery_ratio_threshold >= 0.0
            && self.recovery_ratio_threshold < self.denial_ratio_threshold)
        {
            return Err(
                "recovery_ratio_threshold must be non-negative and below denial_ratio_threshold"
                    .to_string(),
            );
        }
        self.emergency
            .validate()
            .map_err(|e| format!("Emergency policy: {}", e))
    }
}
