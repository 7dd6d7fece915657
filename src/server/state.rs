//! Application state shared across HTTP handlers

use crate::config::Config;
use crate::core::rate_limiter::RateLimitEnforcer;
use crate::monitoring::RateLimitMetrics;
use crate::server::middleware::{
    HeaderPrincipalResolver, PrincipalResolver, RateLimitMiddleware, ScopeClassifier,
};
use std::sync::Arc;

/// HTTP server state shared across handlers
///
/// Every gate holds the same enforcer, so HTTP requests, WebSocket messages
/// and admin reads all see one set of counters and one degradation state.
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration (shared read-only)
    pub config: Arc<Config>,
    /// Decision function behind every gate
    pub enforcer: Arc<RateLimitEnforcer>,
    /// Identity extraction for inbound requests
    pub principals: Arc<dyn PrincipalResolver>,
    /// Path to scope mapping
    pub classifier: Arc<ScopeClassifier>,
    pub metrics: RateLimitMetrics,
}

impl AppState {
    pub fn new(config: Config, enforcer: Arc<RateLimitEnforcer>, metrics: RateLimitMetrics) -> Self {
        let classifier = ScopeClassifier::from_config(&config.gateway.rate_limit);
        Self {
            config: Arc::new(config),
            enforcer,
            principals: Arc::new(HeaderPrincipalResolver::new()),
            classifier: Arc::new(classifier),
            metrics,
        }
    }

    /// Replace the principal resolver
    pub fn with_principal_resolver(mut self, resolver: Arc<dyn PrincipalResolver>) -> Self {
        self.principals = resolver;
        self
    }

    /// Get gateway configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// HTTP gate sharing this state's enforcer
    pub fn rate_limit_middleware(&self) -> RateLimitMiddleware {
        RateLimitMiddleware::new(
            Arc::clone(&self.enforcer),
            Arc::clone(&self.principals),
            Arc::clone(&self.classifier),
        )
    }
}
