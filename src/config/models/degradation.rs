//! Degradation controller configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Overload detection and emergency policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegradationConfig {
    /// Run the controller at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Sampling period in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Number of ticks in the rolling ratio window
    #[serde(default = "default_window_ticks")]
    pub window_ticks: usize,
    /// Consecutive breaching ticks needed to activate
    #[serde(default = "default_sustain_ticks")]
    pub sustain_ticks: u32,
    /// Denial ratio above which a tick counts as breaching
    #[serde(default = "default_denial_ratio_threshold")]
    pub denial_ratio_threshold: f64,
    /// Denial ratio below which the system counts as recovered
    #[serde(default = "default_recovery_ratio_threshold")]
    pub recovery_ratio_threshold: f64,
    /// Minimum decisions in the window before the ratio is trusted
    #[serde(default = "default_min_volume_floor")]
    pub min_volume_floor: u64,
    /// Distinct principals that must be denied within the window, 0 disables
    #[serde(default = "default_min_distinct_principals")]
    pub min_distinct_principals: usize,
    /// Seconds the recovery condition must hold before deactivating
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,
    /// Global ceiling applied to every principal while active
    #[serde(default = "default_emergency_policy")]
    pub emergency: PolicyConfig,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_window_ticks() -> usize {
    10
}

fn default_sustain_ticks() -> u32 {
    3
}

fn default_denial_ratio_threshold() -> f64 {
    0.5
}

fn default_recovery_ratio_threshold() -> f64 {
    0.2
}

fn default_min_volume_floor() -> u64 {
    100
}

fn default_min_distinct_principals() -> usize {
    5
}

fn default_cooldown_seconds() -> u64 {
    30
}

fn default_emergency_policy() -> PolicyConfig {
    PolicyConfig::new(10, 60, 0)
}

impl Default for DegradationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_ms: default_tick_interval_ms(),
            window_ticks: default_window_ticks(),
            sustain_ticks: default_sustain_ticks(),
            denial_ratio_threshold: default_denial_ratio_threshold(),
            recovery_ratio_threshold: default_recovery_ratio_threshold(),
            min_volume_floor: default_min_volume_floor(),
            min_distinct_principals: default_min_distinct_principals(),
            cooldown_seconds: default_cooldown_seconds(),
            emergency: default_emergency_policy(),
        }
    }
}
