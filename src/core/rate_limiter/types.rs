//! Rate limiter types and data structures

use crate::utils::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription tier of a caller
///
/// Ordered from lowest to highest quota; configuration validation relies on
/// this ordering when checking that higher tiers never get smaller limits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Free tier
    #[default]
    Free,
    /// Paid tier
    Pro,
    /// Enterprise tier
    Enterprise,
}

impl Tier {
    /// All tiers, lowest first
    pub const ALL: [Tier; 3] = [Tier::Free, Tier::Pro, Tier::Enterprise];

    /// Tier name for logging, metrics and headers
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Enterprise => "enterprise",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Tier::Free => 0,
            Tier::Pro => 1,
            Tier::Enterprise => 2,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            "enterprise" => Ok(Tier::Enterprise),
            other => Err(GatewayError::validation(format!("Unknown tier: {}", other))),
        }
    }
}

/// The caller a decision is made for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// Stable identifier supplied by the identity layer
    pub id: String,
    /// Subscription tier, fixed for the lifetime of a request
    pub tier: Tier,
}

impl Principal {
    pub fn new(id: impl Into<String>, tier: Tier) -> Self {
        Self {
            id: id.into(),
            tier,
        }
    }
}

/// Dimension a quota applies to, rendered as `service:endpoint_class`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Scope {
    service: String,
    endpoint_class: String,
}

impl Scope {
    /// Create a scope from its parts
    ///
    /// Neither part may be empty or contain `:` or whitespace, which keeps the
    /// rendered counter keys unambiguous.
    pub fn new(service: impl Into<String>, endpoint_class: impl Into<String>) -> crate::Result<Self> {
        let service = service.into();
        let endpoint_class = endpoint_class.into();
        for part in [&service, &endpoint_class] {
            if part.is_empty() || part.contains(':') || part.chars().any(char::is_whitespace) {
                return Err(GatewayError::validation(format!(
                    "Invalid scope component '{}'",
                    part
                )));
            }
        }
        Ok(Self {
            service,
            endpoint_class,
        })
    }

    fn from_static(service: &str, endpoint_class: &str) -> Self {
        Self {
            service: service.to_string(),
            endpoint_class: endpoint_class.to_string(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn endpoint_class(&self) -> &str {
        &self.endpoint_class
    }

    /// `global:all`
    pub fn global() -> Self {
        Self::from_static("global", "all")
    }

    /// `auth:read`
    pub fn auth_read() -> Self {
        Self::from_static("auth", "read")
    }

    /// `backend:chat_message`
    pub fn chat_message() -> Self {
        Self::from_static("backend", "chat_message")
    }

    /// `backend:agent_execute`
    pub fn agent_execute() -> Self {
        Self::from_static("backend", "agent_execute")
    }

    /// `websocket:message`
    pub fn websocket_message() -> Self {
        Self::from_static("websocket", "message")
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service, self.endpoint_class)
    }
}

impl FromStr for Scope {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (service, endpoint_class) = s
            .split_once(':')
            .ok_or_else(|| GatewayError::validation(format!("Invalid scope '{}'", s)))?;
        Scope::new(service, endpoint_class)
    }
}

impl TryFrom<String> for Scope {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.to_string()
    }
}

/// What to do when the counter store cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Admit the request unmetered
    #[default]
    FailOpen,
    /// Reject the request with a generic unavailability error
    FailClosed,
}

/// Quota for one (scope, tier) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub scope: Scope,
    pub tier: Tier,
    /// Nominal requests per window
    pub limit: u64,
    /// Window length in seconds
    pub window_seconds: u64,
    /// Extra requests tolerated above `limit` before denial
    pub burst_allowance: u64,
    pub failure_mode: FailureMode,
}

impl Policy {
    /// Highest count that is still admitted within one window
    pub fn ceiling(&self) -> u64 {
        self.limit.saturating_add(self.burst_allowance)
    }

    /// Start of the fixed window containing `now` (unix seconds)
    pub fn window_start(&self, now: u64) -> u64 {
        let window = self.window_seconds.max(1);
        (now / window) * window
    }
}

/// Address of one counting window for one principal and scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    pub principal_id: String,
    pub scope: Scope,
    pub window_seconds: u64,
    pub window_start: u64,
}

impl CounterKey {
    pub fn new(
        principal_id: impl Into<String>,
        scope: Scope,
        window_seconds: u64,
        window_start: u64,
    ) -> Self {
        Self {
            principal_id: principal_id.into(),
            scope,
            window_seconds,
            window_start,
        }
    }

    /// Key for the window of `policy` that contains `now`
    pub fn for_window(principal: &Principal, policy: &Policy, now: u64) -> Self {
        Self::new(
            principal.id.clone(),
            policy.scope.clone(),
            policy.window_seconds,
            policy.window_start(now),
        )
    }

    /// Render into the store key namespace
    pub fn render(&self, prefix: &str) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            prefix, self.scope, self.principal_id, self.window_seconds, self.window_start
        )
    }
}

/// Outcome of a single rate limit evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Whether the unit of work may proceed
    pub allowed: bool,
    /// Nominal limit of the policy that was applied
    pub limit: u64,
    /// Requests left in the current window
    pub remaining: u64,
    /// Unix timestamp at which the current window ends
    pub reset_at: u64,
    /// Seconds until a retry can succeed, only set on denial
    pub retry_after: Option<u64>,
    /// Window length of the applied policy
    pub window_seconds: u64,
    /// Whether the emergency degradation policy decided the outcome
    pub emergency: bool,
}

impl Decision {
    pub fn allowed(policy: &Policy, count: u64, reset_at: u64, emergency: bool) -> Self {
        Self {
            allowed: true,
            limit: policy.limit,
            remaining: policy.limit.saturating_sub(count),
            reset_at,
            retry_after: None,
            window_seconds: policy.window_seconds,
            emergency,
        }
    }

    pub fn denied(policy: &Policy, reset_at: u64, now: u64, emergency: bool) -> Self {
        Self {
            allowed: false,
            limit: policy.limit,
            remaining: 0,
            reset_at,
            retry_after: Some(reset_at.saturating_sub(now).clamp(1, policy.window_seconds.max(1))),
            window_seconds: policy.window_seconds,
            emergency,
        }
    }

    /// Allowed without touching the store (fail-open path)
    pub fn unmetered(policy: &Policy, reset_at: u64) -> Self {
        Self {
            allowed: true,
            limit: policy.limit,
            remaining: policy.limit,
            reset_at,
            retry_after: None,
            window_seconds: policy.window_seconds,
            emergency: false,
        }
    }

    /// Start of the window this decision was made in
    pub fn window_start(&self) -> u64 {
        self.reset_at.saturating_sub(self.window_seconds)
    }
}
