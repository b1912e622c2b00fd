//! Postgres pool adapter backed by `sqlx`

use crate::metrics::PoolEvent;
use crate::monitor::PoolEventSink;
use crate::pool::{ConnectionPool, PoolError, PoolSettings, PoolState};
use async_trait::async_trait;
use sqlx::Postgres;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::{Duration, Instant};

/// `sqlx` Postgres pool exposed to the monitor.
///
/// `sqlx` pools grow up to their configured maximum and never overflow, so
/// `size` is the configured maximum and `overflow` is always zero.
#[derive(Debug, Clone)]
pub struct PgConnectionPool {
    pool: PgPool,
    events: PoolEventSink,
}

impl PgConnectionPool {
    /// Wrap an existing pool. Its lifecycle hooks are whatever it was built
    /// with; only [`acquire`](Self::acquire) timings reach `events`.
    pub fn from_pool(pool: PgPool, events: PoolEventSink) -> Self {
        Self { pool, events }
    }

    /// Build a pool that opens connections on first use, so the API can boot
    /// while the database is still unreachable.
    ///
    /// Connects, checkouts and checkins are reported to `events` through the
    /// pool's lifecycle hooks.
    pub fn connect_lazy(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
        events: PoolEventSink,
    ) -> Result<Self, PoolError> {
        let pool = with_event_hooks(PgPoolOptions::new(), &events)
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(url)
            .map_err(|e| PoolError::Introspection(e.to_string()))?;
        Ok(Self { pool, events })
    }

    /// Underlying `sqlx` pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Sink receiving this pool's lifecycle events
    pub fn events(&self) -> &PoolEventSink {
        &self.events
    }

    /// Check out a connection and record how long the acquire took
    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>, PoolError> {
        let started = Instant::now();
        let connection = self
            .pool
            .acquire()
            .await
            .map_err(|e| PoolError::Probe(e.to_string()))?;
        self.events.record_connection_time(started.elapsed());
        Ok(connection)
    }
}

/// Install lifecycle hooks that forward pool events to `events`.
///
/// `sqlx` hands a freshly opened connection straight to the caller without
/// running `before_acquire`, so a new connection counts as a connect and a
/// checkout. This holds while `min_connections` is zero, which this adapter
/// never changes.
fn with_event_hooks(options: PgPoolOptions, events: &PoolEventSink) -> PgPoolOptions {
    let on_connect = events.clone();
    let on_acquire = events.clone();
    let on_release = events.clone();
    options
        .after_connect(move |_conn, _meta| {
            on_connect.record_event(PoolEvent::Connect);
            on_connect.record_event(PoolEvent::Checkout);
            Box::pin(async { Ok(()) })
        })
        .before_acquire(move |_conn, _meta| {
            on_acquire.record_event(PoolEvent::Checkout);
            Box::pin(async { Ok(true) })
        })
        .after_release(move |_conn, _meta| {
            on_release.record_event(PoolEvent::Checkin);
            Box::pin(async { Ok(true) })
        })
}

#[async_trait]
impl ConnectionPool for PgConnectionPool {
    fn kind(&self) -> &str {
        "PgPool"
    }

    fn state(&self) -> Result<PoolState, PoolError> {
        if self.pool.is_closed() {
            return Err(PoolError::Closed);
        }
        let open = self.pool.size();
        let idle = u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX);
        Ok(PoolState {
            checked_out: open.saturating_sub(idle),
            size: self.pool.options().get_max_connections(),
            overflow: 0,
        })
    }

    fn settings(&self) -> Option<PoolSettings> {
        let options = self.pool.options();
        Some(PoolSettings {
            size: options.get_max_connections(),
            timeout_secs: Some(options.get_acquire_timeout().as_secs_f64()),
        })
    }

    async fn probe(&self) -> Result<(), PoolError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| PoolError::Probe(e.to_string()))
    }
}

#[cfg(test)]
#[path = "postgres_tests.rs"]
mod postgres_tests;
