//! Shared fixtures for the server unit tests

use async_trait::async_trait;
use sentinelops_monitoring::{ConnectionPool, PoolError, PoolSettings, PoolState};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// In-memory pool whose gauges and probe outcome are set by the test
#[derive(Debug, Default)]
pub struct StaticPool {
    pub checked_out: AtomicU32,
    pub size: u32,
    pub probe_fails: AtomicBool,
}

impl StaticPool {
    pub fn sized(size: u32) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn set_checked_out(&self, checked_out: u32) {
        self.checked_out.store(checked_out, Ordering::SeqCst);
    }

    pub fn fail_probe(&self) {
        self.probe_fails.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectionPool for StaticPool {
    fn kind(&self) -> &str {
        "StaticPool"
    }

    fn state(&self) -> Result<PoolState, PoolError> {
        Ok(PoolState {
            checked_out: self.checked_out.load(Ordering::SeqCst),
            size: self.size,
            overflow: 0,
        })
    }

    fn settings(&self) -> Option<PoolSettings> {
        Some(PoolSettings {
            size: self.size,
            timeout_secs: Some(30.0),
        })
    }

    async fn probe(&self) -> Result<(), PoolError> {
        if self.probe_fails.load(Ordering::SeqCst) {
            return Err(PoolError::Probe(
                "connection to postgres://api:hunter2@db:5432/sentinel refused".to_string(),
            ));
        }
        Ok(())
    }
}
