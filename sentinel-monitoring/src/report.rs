//! Pool health report and status types

use crate::health::HealthStatus;
use crate::metrics::MetricsSnapshot;
use crate::pool::{PoolSettings, PoolState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one pool sub-check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Within thresholds
    Pass,
    /// Threshold crossed
    Warn,
    /// Check failed outright
    Fail,
}

/// Live probe against the pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionCheck {
    /// Pass or fail
    pub status: CheckStatus,
    /// Probe latency in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    /// Probe error, when the check failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionCheck {
    /// Passing check with the probe's response time in seconds
    pub fn pass(response_time: f64) -> Self {
        Self {
            status: CheckStatus::Pass,
            response_time: Some(response_time),
            error: None,
        }
    }

    /// Failing check with the probe error
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            response_time: None,
            error: Some(error.into()),
        }
    }

    /// Whether the probe succeeded
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}

/// Share of the pool currently checked out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaturationCheck {
    /// Pass below the warn ratio, warn at or above it
    pub status: CheckStatus,
    /// `active / size`
    pub utilization: f64,
    /// Checked-out connections
    pub active: u32,
    /// Configured pool size
    pub size: u32,
}

impl SaturationCheck {
    /// Evaluate pool gauges against `warn_ratio`
    pub fn evaluate(state: PoolState, warn_ratio: f64) -> Self {
        let utilization = state.utilization();
        Self {
            status: saturation_status(utilization, warn_ratio),
            utilization,
            active: state.checked_out,
            size: state.size,
        }
    }
}

/// Pass below `warn_ratio`, warn at or above it
pub fn saturation_status(utilization: f64, warn_ratio: f64) -> CheckStatus {
    if utilization < warn_ratio {
        CheckStatus::Pass
    } else {
        CheckStatus::Warn
    }
}

/// Share of recorded query samples above the slow threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlowQueryCheck {
    /// Pass below the warn rate, warn at or above it
    pub status: CheckStatus,
    /// Slow samples over all samples in the window
    pub rate: f64,
    /// Slow samples in the window
    pub count: u64,
}

impl SlowQueryCheck {
    /// Evaluate `slow` of `total` samples against `warn_rate`
    pub fn evaluate(slow: usize, total: usize, warn_rate: f64) -> Self {
        let rate = if total == 0 {
            0.0
        } else {
            slow as f64 / total as f64
        };
        Self {
            status: if rate < warn_rate {
                CheckStatus::Pass
            } else {
                CheckStatus::Warn
            },
            rate,
            count: slow as u64,
        }
    }
}

/// Outcome of each pool sub-check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolChecks {
    /// Live probe
    pub connection: ConnectionCheck,
    /// Checked-out share of the pool
    pub pool_saturation: SaturationCheck,
    /// Slow share of recent queries
    pub slow_queries: SlowQueryCheck,
}

/// Result of `PoolMonitor::health_check`.
///
/// `status` turns unhealthy only when the live probe fails. Saturation and
/// slow-query warnings are reported in `checks` and leave `status` healthy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolHealthReport {
    /// `Unhealthy` only when the probe failed
    pub status: HealthStatus,
    /// When the report was produced
    pub timestamp: DateTime<Utc>,
    /// Sub-check details
    pub checks: PoolChecks,
}

impl PoolHealthReport {
    /// Whether the status is `Healthy`
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    /// Names of the sub-checks that did not pass
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.checks.connection.status != CheckStatus::Pass {
            names.push("connection");
        }
        if self.checks.pool_saturation.status != CheckStatus::Pass {
            names.push("pool_saturation");
        }
        if self.checks.slow_queries.status != CheckStatus::Pass {
            names.push("slow_queries");
        }
        names
    }
}

/// Connection gauges in a pool status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionGauges {
    /// Checked out
    pub active: u32,
    /// Idle
    pub idle: u32,
    /// Size plus overflow
    pub total: u32,
    /// Beyond the pool size
    pub overflow: u32,
    /// Failed health probes
    pub failed: u64,
}

/// Timing statistics in a pool status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// Mean acquire time in seconds
    pub avg_connection_time: f64,
    /// Mean query time in seconds
    pub avg_query_time: f64,
    /// Slow queries in the current window
    pub slow_queries: u64,
}

/// Lifecycle event counters in a pool status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCounters {
    /// Connections borrowed
    pub checkouts: u64,
    /// Connections returned
    pub checkins: u64,
    /// Connections opened
    pub connects: u64,
    /// Connections closed
    pub disconnects: u64,
}

/// Monitor uptime in a pool status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UptimeInfo {
    /// Seconds since the monitor was created
    pub seconds: f64,
    /// Time of the last sampling tick
    pub last_updated: DateTime<Utc>,
}

/// Grouped view of the monitor's metrics, as returned by `get_pool_status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Pool implementation name
    pub pool_class: String,
    /// Connection gauges
    pub connections: ConnectionGauges,
    /// Timing statistics
    pub performance: PerformanceStats,
    /// Lifecycle event counters
    pub events: EventCounters,
    /// Monitor uptime
    pub uptime: UptimeInfo,
    /// Static pool settings, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<PoolSettings>,
}

impl PoolStatus {
    /// Group a snapshot for display
    pub fn from_snapshot(
        pool_class: impl Into<String>,
        snapshot: &MetricsSnapshot,
        config: Option<PoolSettings>,
    ) -> Self {
        Self {
            pool_class: pool_class.into(),
            connections: ConnectionGauges {
                active: snapshot.active_connections,
                idle: snapshot.idle_connections,
                total: snapshot.total_connections,
                overflow: snapshot.overflow_connections,
                failed: snapshot.failed_connections,
            },
            performance: PerformanceStats {
                avg_connection_time: snapshot.avg_connection_time,
                avg_query_time: snapshot.avg_query_time,
                slow_queries: snapshot.slow_queries,
            },
            events: EventCounters {
                checkouts: snapshot.checkouts,
                checkins: snapshot.checkins,
                connects: snapshot.connects,
                disconnects: snapshot.disconnects,
            },
            uptime: UptimeInfo {
                seconds: snapshot.uptime_seconds,
                last_updated: snapshot.last_updated,
            },
            config,
        }
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod report_tests;
