//! Monitoring configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Seconds between two sampling ticks
    pub sample_interval_secs: u64,
    /// Seconds to wait after a failed tick before trying again
    pub error_backoff_secs: u64,
    /// Maximum number of timing samples kept per window
    pub sample_capacity: usize,
    /// Samples strictly above this many seconds count as slow
    pub slow_query_threshold_secs: f64,
    /// Utilization at or above this ratio makes the saturation check warn
    pub saturation_warn_ratio: f64,
    /// Slow-sample rate at or above this ratio makes the slow-query check warn
    pub slow_query_warn_rate: f64,
    /// Upper bound for the live probe issued by `health_check`
    pub probe_timeout_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: 10,
            error_backoff_secs: 30,
            sample_capacity: crate::window::DEFAULT_CAPACITY,
            slow_query_threshold_secs: 1.0,
            saturation_warn_ratio: 0.9,
            slow_query_warn_rate: 0.05,
            probe_timeout_secs: 5,
        }
    }
}

impl MonitoringConfig {
    /// Sampling interval as a `Duration`
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }

    /// Back-off after a failed tick as a `Duration`
    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    /// Probe timeout as a `Duration`
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
