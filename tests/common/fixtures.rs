//! Test fixtures and factories

use ratelimit_gateway::config::{Config, PolicyConfig};
use ratelimit_gateway::core::rate_limiter::{
    DegradationController, ManualClock, Principal, RateLimitEnforcer, Scope, Tier,
};
use ratelimit_gateway::monitoring::RateLimitMetrics;
use ratelimit_gateway::server::AppState;
use ratelimit_gateway::storage::{CounterStore, InMemoryCounterStore};
use std::sync::Arc;

/// A wired gateway with its clock and store exposed
pub struct TestGateway {
    pub config: Config,
    pub clock: ManualClock,
    pub store: Arc<InMemoryCounterStore>,
    pub enforcer: Arc<RateLimitEnforcer>,
}

impl TestGateway {
    /// Default configuration at `now`
    pub fn new(now: u64) -> Self {
        Self::with_config(Config::default(), now)
    }

    pub fn with_config(config: Config, now: u64) -> Self {
        let clock = ManualClock::new(now);
        let store = Arc::new(InMemoryCounterStore::new(Arc::new(clock.clone())));
        let enforcer = Self::enforcer_on(&config, &clock, store.clone());
        Self {
            config,
            clock,
            store,
            enforcer,
        }
    }

    /// A second instance sharing this gateway's store and clock
    pub fn sibling(&self) -> Arc<RateLimitEnforcer> {
        Self::enforcer_on(&self.config, &self.clock, self.store.clone())
    }

    fn enforcer_on(
        config: &Config,
        clock: &ManualClock,
        store: Arc<dyn CounterStore>,
    ) -> Arc<RateLimitEnforcer> {
        Arc::new(
            RateLimitEnforcer::from_config(
                config.rate_limit(),
                config.degradation(),
                store,
                Arc::new(clock.clone()),
                RateLimitMetrics::disabled(),
            )
            .expect("test configuration is valid"),
        )
    }

    pub fn degradation(&self) -> &Arc<DegradationController> {
        self.enforcer.degradation()
    }

    /// HTTP state sharing this gateway's enforcer
    pub fn state(&self) -> AppState {
        AppState::new(
            self.config.clone(),
            Arc::clone(&self.enforcer),
            RateLimitMetrics::disabled(),
        )
    }
}

/// Configuration with admin routes on
pub fn admin_config() -> Config {
    let mut config = Config::default();
    config.gateway.rate_limit.admin_api = true;
    config
}

/// Configuration with a tight free-tier WebSocket quota
pub fn websocket_config(limit: u64) -> Config {
    let mut config = Config::default();
    let ws = config
        .gateway
        .rate_limit
        .scopes
        .iter_mut()
        .find(|s| s.scope == Scope::websocket_message())
        .expect("websocket scope registered by default");
    ws.overrides.free = Some(PolicyConfig::new(limit, 10, 0));
    config
}

/// Degradation tuned to trip within a couple of manual ticks
pub fn fast_degradation_config() -> Config {
    let mut config = admin_config();
    let degradation = &mut config.gateway.degradation;
    degradation.window_ticks = 2;
    degradation.sustain_ticks = 2;
    degradation.min_volume_floor = 20;
    degradation.cooldown_seconds = 5;
    degradation.emergency = PolicyConfig::new(3, 60, 0);
    config
}

/// Principal factory
pub struct PrincipalFactory;

impl PrincipalFactory {
    pub fn free(id: &str) -> Principal {
        Principal::new(id, Tier::Free)
    }

    pub fn pro(id: &str) -> Principal {
        Principal::new(id, Tier::Pro)
    }

    pub fn enterprise(id: &str) -> Principal {
        Principal::new(id, Tier::Enterprise)
    }

    /// `n` distinct free principals
    pub fn many_free(prefix: &str, n: usize) -> Vec<Principal> {
        (0..n).map(|i| Self::free(&format!("{prefix}-{i}"))).collect()
    }
}
