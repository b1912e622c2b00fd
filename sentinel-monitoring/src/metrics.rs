//! Pool metrics snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate of pool gauges, lifecycle counters and timing statistics.
///
/// The four connection gauges are point-in-time readings and move freely
/// between samples. Every other counter only grows for the lifetime of the
/// owning monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Connections checked out at the last tick
    pub active_connections: u32,
    /// Idle connections at the last tick
    pub idle_connections: u32,
    /// Pool size plus overflow at the last tick
    pub total_connections: u32,
    /// Connections beyond the pool size at the last tick
    pub overflow_connections: u32,
    /// Mean connection-acquire time in seconds
    pub avg_connection_time: f64,
    /// Mean query time in seconds
    pub avg_query_time: f64,
    /// Query samples in the current window above the slow threshold
    pub slow_queries: u64,
    /// Failed health probes
    pub failed_connections: u64,
    /// Connections borrowed from the pool
    pub checkouts: u64,
    /// Connections returned to the pool
    pub checkins: u64,
    /// Physical connections opened
    pub connects: u64,
    /// Physical connections closed
    pub disconnects: u64,
    /// Time of the last successful tick
    pub last_updated: DateTime<Utc>,
    /// Seconds since the monitor was created, as of the last tick
    pub uptime_seconds: f64,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            active_connections: 0,
            idle_connections: 0,
            total_connections: 0,
            overflow_connections: 0,
            avg_connection_time: 0.0,
            avg_query_time: 0.0,
            slow_queries: 0,
            failed_connections: 0,
            checkouts: 0,
            checkins: 0,
            connects: 0,
            disconnects: 0,
            last_updated: Utc::now(),
            uptime_seconds: 0.0,
        }
    }
}

/// Connection lifecycle event reported by the data-access layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolEvent {
    /// A new physical connection was opened
    Connect,
    /// A connection was borrowed from the pool
    Checkout,
    /// A connection was returned to the pool
    Checkin,
    /// A physical connection was closed
    Disconnect,
}

impl MetricsSnapshot {
    /// Bump the counter matching `event`
    pub fn apply(&mut self, event: PoolEvent) {
        match event {
            PoolEvent::Connect => self.connects += 1,
            PoolEvent::Checkout => self.checkouts += 1,
            PoolEvent::Checkin => self.checkins += 1,
            PoolEvent::Disconnect => self.disconnects += 1,
        }
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod metrics_tests;
