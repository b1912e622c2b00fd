//! Connection-pool monitor

use crate::{
    config::MonitoringConfig,
    health::{ComponentHealth, HealthCheck, HealthCheckError, HealthStatus},
    metrics::{MetricsSnapshot, PoolEvent},
    pool::{ConnectionPool, PoolError, PoolState},
    report::{
        ConnectionCheck, PoolChecks, PoolHealthReport, PoolStatus, SaturationCheck,
        SlowQueryCheck,
    },
    window::SampleWindow,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Component name the monitor reports under when used as a health check
pub const COMPONENT_NAME: &str = "database";

/// Shortest pause between two sampling ticks, whatever the configuration says
const MIN_TICK_DELAY: Duration = Duration::from_secs(1);

/// Everything the sampler and the recording call sites mutate
#[derive(Debug)]
struct MonitorState {
    snapshot: MetricsSnapshot,
    query_times: SampleWindow,
    connection_times: SampleWindow,
}

struct Sampler {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Observes a connection pool and answers status and health questions.
///
/// Metrics live behind a short-lived mutex that is never held across an
/// await point, so `get_pool_status` stays synchronous and non-blocking.
pub struct PoolMonitor {
    pool: Arc<dyn ConnectionPool>,
    config: MonitoringConfig,
    state: Arc<Mutex<MonitorState>>,
    started_at: Instant,
    sampler: tokio::sync::Mutex<Option<Sampler>>,
}

impl PoolMonitor {
    /// Monitor `pool` with the given thresholds. Sampling starts with [`start`](Self::start).
    pub fn new(pool: Arc<dyn ConnectionPool>, config: MonitoringConfig) -> Self {
        let state = MonitorState {
            snapshot: MetricsSnapshot::default(),
            query_times: SampleWindow::with_capacity(config.sample_capacity),
            connection_times: SampleWindow::with_capacity(config.sample_capacity),
        };
        Self {
            pool,
            config,
            state: Arc::new(Mutex::new(state)),
            started_at: Instant::now(),
            sampler: tokio::sync::Mutex::new(None),
        }
    }

    /// Active thresholds and intervals
    pub fn config(&self) -> &MonitoringConfig {
        &self.config
    }

    /// Spawn the background sampling loop
    pub async fn start(&self) {
        let mut sampler = self.sampler.lock().await;
        if sampler.is_some() {
            warn!("Pool monitor already started");
            return;
        }

        if self.config.sample_interval_secs == 0 || self.config.error_backoff_secs == 0 {
            warn!(
                "Zero sampling interval or back-off configured, ticking every {}s instead",
                MIN_TICK_DELAY.as_secs()
            );
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(sampling_loop(
            self.pool.clone(),
            self.state.clone(),
            self.config.clone(),
            self.started_at,
            cancel.clone(),
        ));
        *sampler = Some(Sampler { cancel, task });
        info!(
            "Pool monitor started, sampling every {}s",
            self.config.sample_interval_secs
        );
    }

    /// Cancel the sampling loop and wait for it to finish
    pub async fn stop(&self) {
        let Some(sampler) = self.sampler.lock().await.take() else {
            return;
        };
        sampler.cancel.cancel();
        if let Err(e) = sampler.task.await {
            error!("Pool monitor sampler ended abnormally: {}", e);
        }
        info!("Pool monitor stopped");
    }

    /// Whether the sampler task is running
    pub async fn is_running(&self) -> bool {
        self.sampler.lock().await.is_some()
    }

    /// Add a query duration to the query window
    pub fn record_query_time(&self, duration: Duration) {
        self.lock().query_times.record(duration.as_secs_f64());
    }

    /// Add a connection-acquire duration to the connection window
    pub fn record_connection_time(&self, duration: Duration) {
        self.lock().connection_times.record(duration.as_secs_f64());
    }

    /// Count a pool lifecycle event
    pub fn record_event(&self, event: PoolEvent) {
        self.lock().snapshot.apply(event);
    }

    /// Run one sampling tick immediately
    pub fn sample_now(&self) -> Result<(), PoolError> {
        sample(
            self.pool.as_ref(),
            &self.state,
            &self.config,
            self.started_at,
        )
    }

    /// Copy of the current metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.lock().snapshot.clone()
    }

    /// Probe the pool and evaluate saturation and slow-query thresholds
    pub async fn health_check(&self) -> PoolHealthReport {
        let started = Instant::now();
        let probe = tokio::time::timeout(self.config.probe_timeout(), self.pool.probe())
            .await
            .unwrap_or(Err(PoolError::ProbeTimeout(self.config.probe_timeout_secs)));

        let connection = match probe {
            Ok(()) => ConnectionCheck::pass(started.elapsed().as_secs_f64()),
            Err(e) => {
                warn!("Pool health probe failed: {}", e);
                self.lock().snapshot.failed_connections += 1;
                ConnectionCheck::fail(e.to_string())
            }
        };

        let pool_state = match self.pool.state() {
            Ok(state) => state,
            Err(e) => {
                warn!("Pool introspection failed during health check: {}", e);
                let state = self.lock();
                PoolState {
                    checked_out: state.snapshot.active_connections,
                    size: state
                        .snapshot
                        .total_connections
                        .saturating_sub(state.snapshot.overflow_connections),
                    overflow: state.snapshot.overflow_connections,
                }
            }
        };
        let pool_saturation =
            SaturationCheck::evaluate(pool_state, self.config.saturation_warn_ratio);

        let slow_queries = {
            let state = self.lock();
            SlowQueryCheck::evaluate(
                state.query_times.count_over(self.config.slow_query_threshold_secs),
                state.query_times.len(),
                self.config.slow_query_warn_rate,
            )
        };

        let status = if connection.passed() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        PoolHealthReport {
            status,
            timestamp: Utc::now(),
            checks: PoolChecks {
                connection,
                pool_saturation,
                slow_queries,
            },
        }
    }

    /// Grouped snapshot of every metric plus static pool settings
    pub fn get_pool_status(&self) -> PoolStatus {
        let snapshot = self.snapshot();
        PoolStatus::from_snapshot(self.pool.kind(), &snapshot, self.pool.settings())
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Forwards pool lifecycle events and acquire timings to a monitor.
///
/// Pool adapters install their hooks before the monitor that wraps them
/// exists, so the sink starts detached and is bound once with [`attach`].
/// Events recorded while detached, or after the monitor is dropped, are
/// discarded. The sink only holds a weak reference, so a pool owning it does
/// not keep its monitor alive.
///
/// [`attach`]: PoolEventSink::attach
#[derive(Debug, Clone, Default)]
pub struct PoolEventSink {
    target: Arc<OnceLock<Weak<PoolMonitor>>>,
}

impl PoolEventSink {
    /// Create a detached sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the sink to `monitor`. Returns `false` if it was already bound.
    pub fn attach(&self, monitor: &Arc<PoolMonitor>) -> bool {
        self.target.set(Arc::downgrade(monitor)).is_ok()
    }

    /// Whether a live monitor is receiving events
    pub fn is_attached(&self) -> bool {
        self.monitor().is_some()
    }

    /// Count a lifecycle event
    pub fn record_event(&self, event: PoolEvent) {
        if let Some(monitor) = self.monitor() {
            monitor.record_event(event);
        }
    }

    /// Record how long a connection acquire took
    pub fn record_connection_time(&self, duration: Duration) {
        if let Some(monitor) = self.monitor() {
            monitor.record_connection_time(duration);
        }
    }

    /// Record how long a query took
    pub fn record_query_time(&self, duration: Duration) {
        if let Some(monitor) = self.monitor() {
            monitor.record_query_time(duration);
        }
    }

    fn monitor(&self) -> Option<Arc<PoolMonitor>> {
        self.target.get().and_then(Weak::upgrade)
    }
}

#[async_trait]
impl HealthCheck for PoolMonitor {
    async fn check(&self) -> Result<ComponentHealth, HealthCheckError> {
        let report = self.health_check().await;
        let mut component = ComponentHealth::new(COMPONENT_NAME, report.status);
        if let Some(error) = &report.checks.connection.error {
            component = component.with_message(error.clone());
        } else {
            let warnings = report.warnings();
            if !warnings.is_empty() {
                component = component.with_message(format!("warnings: {}", warnings.join(", ")));
            }
        }
        let checks = serde_json::to_value(&report.checks)
            .map_err(|e| HealthCheckError::failed(e.to_string()))?;
        Ok(component.with_metadata("checks", checks))
    }
}

async fn sampling_loop(
    pool: Arc<dyn ConnectionPool>,
    state: Arc<Mutex<MonitorState>>,
    config: MonitoringConfig,
    started_at: Instant,
    cancel: CancellationToken,
) {
    loop {
        let delay = match sample(pool.as_ref(), &state, &config, started_at) {
            Ok(()) => config.sample_interval(),
            Err(e) => {
                error!(
                    "Pool sampling failed, retrying in {}s: {}",
                    config.error_backoff_secs, e
                );
                config.error_backoff()
            }
        }
        .max(MIN_TICK_DELAY);

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Pool sampler cancelled");
                break;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

fn sample(
    pool: &dyn ConnectionPool,
    state: &Mutex<MonitorState>,
    config: &MonitoringConfig,
    started_at: Instant,
) -> Result<(), PoolError> {
    let gauges = pool.state()?;
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);

    let avg_query_time = state.query_times.mean();
    let avg_connection_time = state.connection_times.mean();
    let slow_queries = state.query_times.count_over(config.slow_query_threshold_secs) as u64;

    let snapshot = &mut state.snapshot;
    snapshot.active_connections = gauges.checked_out;
    snapshot.idle_connections = gauges.idle();
    snapshot.total_connections = gauges.total();
    snapshot.overflow_connections = gauges.overflow;
    snapshot.avg_query_time = avg_query_time;
    snapshot.avg_connection_time = avg_connection_time;
    snapshot.slow_queries = slow_queries;
    snapshot.uptime_seconds = started_at.elapsed().as_secs_f64();
    snapshot.last_updated = Utc::now();
    Ok(())
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod monitor_tests;
