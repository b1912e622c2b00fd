//! Observed connection pool interface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while observing a pool
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool was closed
    #[error("Connection pool is closed")]
    Closed,

    /// The live probe failed
    #[error("Pool probe failed: {0}")]
    Probe(String),

    /// The live probe did not finish in time
    #[error("Pool probe timed out after {0}s")]
    ProbeTimeout(u64),

    /// Gauges could not be read
    #[error("Pool introspection failed: {0}")]
    Introspection(String),
}

/// Point-in-time gauges read from a pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    /// Connections currently lent out
    pub checked_out: u32,
    /// Configured steady-state pool size
    pub size: u32,
    /// Connections open beyond `size`
    pub overflow: u32,
}

impl PoolState {
    /// `size - checked_out`, floored at zero
    pub fn idle(&self) -> u32 {
        self.size.saturating_sub(self.checked_out)
    }

    /// `size + overflow`, saturating
    pub fn total(&self) -> u32 {
        self.size.saturating_add(self.overflow)
    }

    /// `checked_out / size`, or `0.0` for an unsized pool
    pub fn utilization(&self) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        f64::from(self.checked_out) / f64::from(self.size)
    }
}

/// Static pool settings, when the adapter exposes them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSettings {
    /// Configured pool size
    pub size: u32,
    /// Acquire timeout in seconds
    pub timeout_secs: Option<f64>,
}

/// A connection pool the monitor can observe.
///
/// The monitor never borrows connections for application work. It only reads
/// gauges and, during health checks, asks the pool to run a trivial statement.
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    /// Implementation name reported in pool status
    fn kind(&self) -> &str;

    /// Current gauges. Fails when the pool can no longer be introspected.
    fn state(&self) -> Result<PoolState, PoolError>;

    /// Static settings, if the adapter knows them
    fn settings(&self) -> Option<PoolSettings> {
        None
    }

    /// Open a connection and execute a trivial read-only statement
    async fn probe(&self) -> Result<(), PoolError>;
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod pool_tests;
