//! Rate limiting configuration

use super::*;
use crate::core::rate_limiter::types::{FailureMode, Scope, Tier};
use serde::{Deserialize, Serialize};

/// Quota numbers for one tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Requests per window
    pub limit: u64,
    /// Window length in seconds
    pub window_seconds: u64,
    /// Requests tolerated above the limit
    #[serde(default)]
    pub burst_allowance: u64,
}

impl PolicyConfig {
    pub const fn new(limit: u64, window_seconds: u64, burst_allowance: u64) -> Self {
        Self {
            limit,
            window_seconds,
            burst_allowance,
        }
    }
}

/// Per-tier quotas
///
/// Used as the fallback policy for scopes without an explicit override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPolicies<T> {
    pub free: T,
    pub pro: T,
    pub enterprise: T,
}

impl<T> TierPolicies<T> {
    pub fn get(&self, tier: Tier) -> &T {
        match tier {
            Tier::Free => &self.free,
            Tier::Pro => &self.pro,
            Tier::Enterprise => &self.enterprise,
        }
    }
}

impl Default for TierPolicies<PolicyConfig> {
    fn default() -> Self {
        Self {
            free: PolicyConfig::new(60, 60, 0),
            pro: PolicyConfig::new(600, 60, 10),
            enterprise: PolicyConfig::new(6000, 60, 100),
        }
    }
}

/// Optional per-tier overrides for one scope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free: Option<PolicyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pro: Option<PolicyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise: Option<PolicyConfig>,
}

impl TierOverrides {
    pub fn get(&self, tier: Tier) -> Option<&PolicyConfig> {
        match tier {
            Tier::Free => self.free.as_ref(),
            Tier::Pro => self.pro.as_ref(),
            Tier::Enterprise => self.enterprise.as_ref(),
        }
    }
}

/// A registered scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeConfig {
    pub scope: Scope,
    #[serde(default)]
    pub failure_mode: FailureMode,
    #[serde(default)]
    pub overrides: TierOverrides,
}

impl ScopeConfig {
    pub fn new(scope: Scope, failure_mode: FailureMode) -> Self {
        Self {
            scope,
            failure_mode,
            overrides: TierOverrides::default(),
        }
    }

    fn with_overrides(mut self, free: PolicyConfig, pro: PolicyConfig, enterprise: PolicyConfig) -> Self {
        self.overrides = TierOverrides {
            free: Some(free),
            pro: Some(pro),
            enterprise: Some(enterprise),
        };
        self
    }
}

/// Maps a path prefix onto a scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    pub prefix: String,
    pub scope: Scope,
}

impl RouteRule {
    pub fn new(prefix: impl Into<String>, scope: Scope) -> Self {
        Self {
            prefix: prefix.into(),
            scope,
        }
    }
}

/// WebSocket message gate settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSocketGateConfig {
    /// Scope every inbound data message is charged against
    #[serde(default = "Scope::websocket_message")]
    pub scope: Scope,
    /// Close once violations occur in this many consecutive windows
    #[serde(default = "default_close_after_violation_windows")]
    pub close_after_violation_windows: u32,
    /// Close when more messages than this are dropped in one throttle episode
    #[serde(default = "default_max_dropped_while_throttled")]
    pub max_dropped_while_throttled: u64,
}

fn default_close_after_violation_windows() -> u32 {
    2
}

fn default_max_dropped_while_throttled() -> u64 {
    100
}

impl Default for WebSocketGateConfig {
    fn default() -> Self {
        Self {
            scope: Scope::websocket_message(),
            close_after_violation_windows: default_close_after_violation_windows(),
            max_dropped_while_throttled: default_max_dropped_while_throttled(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Namespace prefix for counter keys, shared by every service
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Budget for a single counter store call in milliseconds
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// Seconds a counter outlives its window
    #[serde(default = "default_ttl_grace")]
    pub ttl_grace_seconds: u64,
    /// Fallback quotas per tier
    #[serde(default)]
    pub tier_defaults: TierPolicies<PolicyConfig>,
    /// Registered scopes
    #[serde(default = "default_scopes")]
    pub scopes: Vec<ScopeConfig>,
    /// Path prefix classification
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteRule>,
    /// Paths never rate limited
    #[serde(default = "default_exempt_paths")]
    pub exempt_paths: Vec<String>,
    /// Scope for paths matching no route
    #[serde(default = "Scope::global")]
    pub default_scope: Scope,
    #[serde(default)]
    pub websocket: WebSocketGateConfig,
    /// Expose the admin endpoints
    #[serde(default)]
    pub admin_api: bool,
}

fn default_scopes() -> Vec<ScopeConfig> {
    vec![
        ScopeConfig::new(Scope::global(), FailureMode::FailOpen),
        ScopeConfig::new(Scope::auth_read(), FailureMode::FailOpen).with_overrides(
            PolicyConfig::new(30, 60, 0),
            PolicyConfig::new(300, 60, 10),
            PolicyConfig::new(3000, 60, 100),
        ),
        ScopeConfig::new(Scope::chat_message(), FailureMode::FailOpen).with_overrides(
            PolicyConfig::new(5, 60, 0),
            PolicyConfig::new(50, 60, 5),
            PolicyConfig::new(500, 60, 50),
        ),
        ScopeConfig::new(Scope::agent_execute(), FailureMode::FailClosed).with_overrides(
            PolicyConfig::new(2, 60, 0),
            PolicyConfig::new(20, 60, 2),
            PolicyConfig::new(200, 60, 20),
        ),
        ScopeConfig::new(Scope::websocket_message(), FailureMode::FailOpen).with_overrides(
            PolicyConfig::new(20, 10, 0),
            PolicyConfig::new(100, 10, 10),
            PolicyConfig::new(500, 10, 50),
        ),
    ]
}

fn default_routes() -> Vec<RouteRule> {
    vec![
        RouteRule::new("/api/chat", Scope::chat_message()),
        RouteRule::new("/api/agents", Scope::agent_execute()),
        RouteRule::new("/auth", Scope::auth_read()),
    ]
}

fn default_exempt_paths() -> Vec<String> {
    vec!["/health".to_string(), "/metrics".to_string()]
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key_prefix: default_key_prefix(),
            store_timeout_ms: default_store_timeout_ms(),
            ttl_grace_seconds: default_ttl_grace(),
            tier_defaults: TierPolicies::default(),
            scopes: default_scopes(),
            routes: default_routes(),
            exempt_paths: default_exempt_paths(),
            default_scope: Scope::global(),
            websocket: WebSocketGateConfig::default(),
            admin_api: false,
        }
    }
}

impl RateLimitConfig {
    /// Look up a registered scope
    pub fn scope(&self, scope: &Scope) -> Option<&ScopeConfig> {
        self.scopes.iter().find(|s| &s.scope == scope)
    }

    /// Quota that applies to `tier` within `scope`, override first
    pub fn effective_policy(&self, scope: &ScopeConfig, tier: Tier) -> PolicyConfig {
        scope
            .overrides
            .get(tier)
            .copied()
            .unwrap_or_else(|| *self.tier_defaults.get(tier))
    }
}
