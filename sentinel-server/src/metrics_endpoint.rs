//! Prometheus export of pool metrics and websocket connections

use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use prometheus::{Counter, Encoder, Gauge, Registry, TextEncoder};
use sentinelops_monitoring::{MetricsSnapshot, PoolMonitor};
use sentinelops_transport::ConnectionRegistry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Prometheus metrics registry.
///
/// Counters are mirrored from the monitor snapshot with a reset followed by an
/// increment, so every update and gather runs under `scrape` to keep readers
/// from seeing a half-applied value.
pub struct PrometheusMetrics {
    registry: Registry,
    scrape: Mutex<()>,
    active_connections: Gauge,
    idle_connections: Gauge,
    total_connections: Gauge,
    overflow_connections: Gauge,
    avg_connection_time: Gauge,
    avg_query_time: Gauge,
    slow_queries: Gauge,
    failed_connections: Counter,
    checkouts: Counter,
    checkins: Counter,
    connects: Counter,
    disconnects: Counter,
    uptime: Gauge,
    websocket_connections: Gauge,
}

impl PrometheusMetrics {
    /// Create and register every collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let active_connections = Gauge::new(
            "sentinelops_db_pool_active_connections",
            "Connections currently checked out",
        )?;
        let idle_connections = Gauge::new(
            "sentinelops_db_pool_idle_connections",
            "Connections idle in the pool",
        )?;
        let total_connections = Gauge::new(
            "sentinelops_db_pool_total_connections",
            "Pool size plus overflow",
        )?;
        let overflow_connections = Gauge::new(
            "sentinelops_db_pool_overflow_connections",
            "Connections open beyond the pool size",
        )?;
        let avg_connection_time = Gauge::new(
            "sentinelops_db_pool_avg_connection_time_seconds",
            "Mean connection-acquire time over the sample window",
        )?;
        let avg_query_time = Gauge::new(
            "sentinelops_db_avg_query_time_seconds",
            "Mean query time over the sample window",
        )?;
        let slow_queries = Gauge::new(
            "sentinelops_db_slow_queries",
            "Slow queries in the current sample window",
        )?;
        let failed_connections = Counter::new(
            "sentinelops_db_pool_failed_connections_total",
            "Failed pool health probes",
        )?;
        let checkouts = Counter::new(
            "sentinelops_db_pool_checkouts_total",
            "Connections borrowed from the pool",
        )?;
        let checkins = Counter::new(
            "sentinelops_db_pool_checkins_total",
            "Connections returned to the pool",
        )?;
        let connects = Counter::new(
            "sentinelops_db_pool_connects_total",
            "Physical connections opened",
        )?;
        let disconnects = Counter::new(
            "sentinelops_db_pool_disconnects_total",
            "Physical connections closed",
        )?;
        let uptime = Gauge::new(
            "sentinelops_db_pool_monitor_uptime_seconds",
            "Seconds since the pool monitor was created",
        )?;
        let websocket_connections = Gauge::new(
            "sentinelops_websocket_connections",
            "Connected websocket clients",
        )?;

        for collector in [
            &active_connections,
            &idle_connections,
            &total_connections,
            &overflow_connections,
            &avg_connection_time,
            &avg_query_time,
            &slow_queries,
            &uptime,
            &websocket_connections,
        ] {
            registry.register(Box::new(collector.clone()))?;
        }
        for collector in [
            &failed_connections,
            &checkouts,
            &checkins,
            &connects,
            &disconnects,
        ] {
            registry.register(Box::new(collector.clone()))?;
        }

        Ok(Self {
            registry,
            scrape: Mutex::new(()),
            active_connections,
            idle_connections,
            total_connections,
            overflow_connections,
            avg_connection_time,
            avg_query_time,
            slow_queries,
            failed_connections,
            checkouts,
            checkins,
            connects,
            disconnects,
            uptime,
            websocket_connections,
        })
    }

    /// Mirror a monitor snapshot and the live websocket count
    pub fn update(&self, snapshot: &MetricsSnapshot, websocket_connections: usize) {
        let _scrape = self.lock();
        self.mirror(snapshot, websocket_connections);
    }

    /// Render metrics in Prometheus format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let _scrape = self.lock();
        self.encode()
    }

    /// Mirror a snapshot and render it as one step
    pub fn scrape(
        &self,
        snapshot: &MetricsSnapshot,
        websocket_connections: usize,
    ) -> Result<String, prometheus::Error> {
        let _scrape = self.lock();
        self.mirror(snapshot, websocket_connections);
        self.encode()
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.scrape.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mirror(&self, snapshot: &MetricsSnapshot, websocket_connections: usize) {
        self.active_connections
            .set(f64::from(snapshot.active_connections));
        self.idle_connections.set(f64::from(snapshot.idle_connections));
        self.total_connections
            .set(f64::from(snapshot.total_connections));
        self.overflow_connections
            .set(f64::from(snapshot.overflow_connections));
        self.avg_connection_time.set(snapshot.avg_connection_time);
        self.avg_query_time.set(snapshot.avg_query_time);
        self.slow_queries.set(snapshot.slow_queries as f64);
        self.uptime.set(snapshot.uptime_seconds);
        self.websocket_connections.set(websocket_connections as f64);

        for (counter, value) in [
            (&self.failed_connections, snapshot.failed_connections),
            (&self.checkouts, snapshot.checkouts),
            (&self.checkins, snapshot.checkins),
            (&self.connects, snapshot.connects),
            (&self.disconnects, snapshot.disconnects),
        ] {
            counter.reset();
            counter.inc_by(value as f64);
        }
    }

    fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// State for metrics endpoint
pub struct MetricsState {
    /// Exported collectors
    pub prometheus: Arc<PrometheusMetrics>,
    /// Source of pool metrics
    pub monitor: Arc<PoolMonitor>,
    /// Source of the websocket connection count
    pub registry: Arc<ConnectionRegistry>,
}

/// Handler for /metrics endpoint
pub async fn metrics_handler(State(state): State<Arc<MetricsState>>) -> impl IntoResponse {
    let connections = state.registry.connection_count().await;
    match state
        .prometheus
        .scrape(&state.monitor.snapshot(), connections)
    {
        Ok(metrics) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            metrics,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error rendering metrics: {e}"),
        )
            .into_response(),
    }
}

/// Create metrics router
pub fn create_metrics_router(
    prometheus: Arc<PrometheusMetrics>,
    monitor: Arc<PoolMonitor>,
    registry: Arc<ConnectionRegistry>,
) -> Router {
    let state = Arc::new(MetricsState {
        prometheus,
        monitor,
        registry,
    });

    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
