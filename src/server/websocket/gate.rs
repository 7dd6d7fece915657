//! Per-connection warn-then-disconnect state machine

use crate::config::WebSocketGateConfig;
use crate::core::rate_limiter::{Clock, Decision, Principal, RateLimitEnforcer, Scope};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lifecycle of a gated connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    /// Messages are dropped until the violating window ends
    Throttled { until: u64 },
    Closing,
    Closed,
}

/// What the session loop should do with an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateAction {
    /// Process the message
    Forward,
    /// Drop the message and tell the client to back off
    Warn { retry_after: u64 },
    /// Drop the message without a reply
    Drop,
    /// Drop the message and report an internal failure
    Error { message: String },
    /// Close with a policy violation
    Close { reason: String },
}

/// Control messages sent to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerNotice {
    RateLimitExceeded { retry_after: u64 },
    Error { message: String },
    Ack,
}

impl ServerNotice {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"error"}"#.to_string())
    }
}

/// Gate for one WebSocket connection
pub struct WebSocketRateGate {
    enforcer: Arc<RateLimitEnforcer>,
    clock: Arc<dyn Clock>,
    principal: Principal,
    scope: Scope,
    config: WebSocketGateConfig,
    state: ConnectionState,
    /// End of the most recent window that saw a violation
    last_violation_reset_at: Option<u64>,
    consecutive_violation_windows: u32,
    dropped_in_episode: u64,
}

impl WebSocketRateGate {
    pub fn new(
        enforcer: Arc<RateLimitEnforcer>,
        principal: Principal,
        config: WebSocketGateConfig,
    ) -> Self {
        let clock = Arc::clone(enforcer.clock());
        Self {
            enforcer,
            clock,
            principal,
            scope: config.scope.clone(),
            config,
            state: ConnectionState::Open,
            last_violation_reset_at: None,
            consecutive_violation_windows: 0,
            dropped_in_episode: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Evaluate one inbound data message
    pub async fn on_message(&mut self) -> GateAction {
        match self.state {
            ConnectionState::Closing | ConnectionState::Closed => return GateAction::Drop,
            ConnectionState::Throttled { until } => {
                if self.clock.now_secs() < until {
                    self.dropped_in_episode += 1;
                    if self.dropped_in_episode > self.config.max_dropped_while_throttled {
                        return self.close(format!(
                            "more than {} messages sent while throttled",
                            self.config.max_dropped_while_throttled
                        ));
                    }
                    return GateAction::Drop;
                }
                debug!(principal = %self.principal.id, "WebSocket throttle lifted");
                self.state = ConnectionState::Open;
                self.dropped_in_episode = 0;
            }
            ConnectionState::Open => {}
        }

        match self.enforcer.check(&self.principal, &self.scope).await {
            Ok(decision) if decision.allowed => GateAction::Forward,
            Ok(decision) => self.on_violation(&decision),
            Err(e) => {
                warn!(
                    principal = %self.principal.id,
                    error = %e,
                    "WebSocket message could not be checked, dropping it"
                );
                GateAction::Error {
                    message: "Message could not be processed, please retry later".to_string(),
                }
            }
        }
    }

    fn on_violation(&mut self, decision: &Decision) -> GateAction {
        let follows_previous = self
            .last_violation_reset_at
            .is_some_and(|previous_end| decision.window_start() <= previous_end);

        self.consecutive_violation_windows = if follows_previous {
            self.consecutive_violation_windows + 1
        } else {
            1
        };
        self.last_violation_reset_at = Some(decision.reset_at);

        if self.consecutive_violation_windows >= self.config.close_after_violation_windows {
            return self.close(format!(
                "message rate exceeded in {} consecutive windows",
                self.consecutive_violation_windows
            ));
        }

        self.state = ConnectionState::Throttled {
            until: decision.reset_at,
        };
        self.dropped_in_episode = 0;
        GateAction::Warn {
            retry_after: decision.retry_after.unwrap_or(1),
        }
    }

    fn close(&mut self, reason: String) -> GateAction {
        warn!(
            principal = %self.principal.id,
            reason = %reason,
            "Closing WebSocket connection for rate limit abuse"
        );
        self.state = ConnectionState::Closing;
        GateAction::Close { reason }
    }

    /// Record that the close handshake finished
    pub fn mark_closed(&mut self) {
        self.state = ConnectionState::Closed;
    }
}
