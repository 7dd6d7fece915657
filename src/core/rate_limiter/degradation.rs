//! System-wide overload detection
//!
//! The controller samples the denial ratio of recent decisions on a fixed
//! tick. When the ratio stays high across enough traffic and enough distinct
//! principals are being denied, it publishes an active [`DegradationState`],
//! and the enforcer then caps every principal at the emergency policy. It
//! never talks to the counter store.

use super::clock::Clock;
use super::types::Policy;
use crate::config::DegradationConfig;
use crate::monitoring::RateLimitMetrics;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Snapshot published by the controller
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DegradationState {
    pub active: bool,
    pub activated_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

/// State change produced by a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradationTransition {
    Activated,
    Deactivated,
}

/// Decisions drained from one tick
#[derive(Debug, Default)]
struct Sample {
    total: u64,
    denied: u64,
    /// Denied principals, capped at `min_distinct_principals`
    offenders: HashSet<String>,
}

#[derive(Debug, Default)]
struct RollingWindow {
    /// Oldest first
    samples: VecDeque<Sample>,
    breaching_ticks: u32,
    recovering_since: Option<u64>,
}

impl RollingWindow {
    fn totals(&self) -> (u64, u64) {
        self.samples
            .iter()
            .fold((0, 0), |(t, d), sample| (t + sample.total, d + sample.denied))
    }

    /// Distinct denied principals across the window, counted up to `cap`
    fn distinct_offenders(&self, cap: usize) -> usize {
        let mut seen: HashSet<&str> = HashSet::new();
        for sample in &self.samples {
            for id in &sample.offenders {
                seen.insert(id);
                if seen.len() >= cap {
                    return cap;
                }
            }
        }
        seen.len()
    }
}

/// Owner of the process-wide [`DegradationState`]
pub struct DegradationController {
    config: DegradationConfig,
    clock: Arc<dyn Clock>,
    state: ArcSwap<DegradationState>,
    total: AtomicU64,
    denied: AtomicU64,
    offenders: Mutex<HashSet<String>>,
    window: Mutex<RollingWindow>,
    metrics: RateLimitMetrics,
}

impl std::fmt::Debug for DegradationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DegradationController")
            .field("active", &self.is_active())
            .field("config", &self.config)
            .finish()
    }
}

impl DegradationController {
    pub fn new(config: DegradationConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: ArcSwap::from_pointee(DegradationState::default()),
            total: AtomicU64::new(0),
            denied: AtomicU64::new(0),
            offenders: Mutex::new(HashSet::new()),
            window: Mutex::new(RollingWindow::default()),
            metrics: RateLimitMetrics::disabled(),
        }
    }

    pub fn with_metrics(mut self, metrics: RateLimitMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &DegradationConfig {
        &self.config
    }

    /// Lock-free check used on every decision
    pub fn is_active(&self) -> bool {
        self.state.load().active
    }

    pub fn state(&self) -> Arc<DegradationState> {
        self.state.load_full()
    }

    /// Count one decision towards the next tick's sample
    ///
    /// `allowed` is the outcome under the principal's own tier policy, so
    /// denials caused only by the emergency ceiling never feed the ratio.
    pub fn record_decision(&self, principal_id: &str, allowed: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if allowed {
            return;
        }
        self.denied.fetch_add(1, Ordering::Relaxed);

        let cap = self.config.min_distinct_principals;
        if cap > 0 {
            let mut offenders = self.offenders.lock();
            if offenders.len() < cap && !offenders.contains(principal_id) {
                offenders.insert(principal_id.to_owned());
            }
        }
    }

    /// Emergency ceiling for the scope and tier of `base`
    pub fn emergency_policy(&self, base: &Policy) -> Policy {
        Policy {
            scope: base.scope.clone(),
            tier: base.tier,
            limit: self.config.emergency.limit,
            window_seconds: self.config.emergency.window_seconds,
            burst_allowance: self.config.emergency.burst_allowance,
            failure_mode: base.failure_mode,
        }
    }

    /// Drain the sample counters and re-evaluate the state
    pub fn tick(&self) -> Option<DegradationTransition> {
        let total = self.total.swap(0, Ordering::Relaxed);
        let denied = self.denied.swap(0, Ordering::Relaxed).min(total);
        let offenders = std::mem::take(&mut *self.offenders.lock());
        let now = self.clock.now_secs();

        let mut window = self.window.lock();
        window.samples.push_back(Sample {
            total,
            denied,
            offenders,
        });
        while window.samples.len() > self.config.window_ticks {
            window.samples.pop_front();
        }

        let (window_total, window_denied) = window.totals();
        let ratio = if window_total == 0 {
            0.0
        } else {
            window_denied as f64 / window_total as f64
        };
        let enough_volume = window_total >= self.config.min_volume_floor;
        let floor = self.config.min_distinct_principals;
        let widespread = window.distinct_offenders(floor) >= floor;

        if !self.is_active() {
            if enough_volume && widespread && ratio > self.config.denial_ratio_threshold {
                window.breaching_ticks += 1;
            } else {
                window.breaching_ticks = 0;
            }

            if window.breaching_ticks >= self.config.sustain_ticks {
                window.breaching_ticks = 0;
                window.recovering_since = None;
                let reason = format!(
                    "denial ratio {:.2} over {} decisions exceeded {:.2}",
                    ratio, window_total, self.config.denial_ratio_threshold
                );
                warn!("Activating emergency rate limits: {}", reason);
                self.state.store(Arc::new(DegradationState {
                    active: true,
                    activated_at: Some(Utc::now()),
                    reason: Some(reason),
                }));
                self.metrics.set_degradation_active(true);
                return Some(DegradationTransition::Activated);
            }
            return None;
        }

        let recovered =
            !enough_volume || !widespread || ratio < self.config.recovery_ratio_threshold;
        if !recovered {
            window.recovering_since = None;
            return None;
        }

        let since = *window.recovering_since.get_or_insert(now);
        if now.saturating_sub(since) < self.config.cooldown_seconds {
            debug!(
                ratio,
                recovering_for = now.saturating_sub(since),
                "Degradation recovering"
            );
            return None;
        }

        info!("Lifting emergency rate limits, denial ratio {:.2}", ratio);
        window.samples.clear();
        window.recovering_since = None;
        self.state.store(Arc::new(DegradationState::default()));
        self.metrics.set_degradation_active(false);
        Some(DegradationTransition::Deactivated)
    }

    /// Run [`tick`](Self::tick) on the configured interval until shutdown
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = Duration::from_millis(self.config.tick_interval_ms.max(1));
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!("Degradation controller started, tick every {:?}", period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.tick();
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("Degradation controller stopped");
                            break;
                        }
                    }
                }
            }
        })
    }
}
