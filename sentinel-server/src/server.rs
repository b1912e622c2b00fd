//! SentinelOps server composition root

use crate::{
    checks::register_default_checks,
    config::ServerConfig,
    events::EventPublisher,
    health_endpoint::create_health_router,
    metrics_endpoint::{PrometheusMetrics, create_metrics_router},
    pool_endpoint::create_pool_router,
    websocket_endpoint::create_websocket_router,
};
use axum::Router;
use sentinelops_logging::LogSanitizer;
use sentinelops_monitoring::{
    ConnectionPool, PgConnectionPool, PoolEventSink, PoolMonitor, SystemHealthAggregator,
};
use sentinelops_transport::ConnectionRegistry;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Error type for server operations
#[derive(Debug, Error)]
pub enum ServerError {
    /// Invalid configuration
    #[error("Server configuration error: {0}")]
    Configuration(String),

    /// The database pool could not be created
    #[error("Database error: {0}")]
    Database(String),

    /// A default health check could not be registered
    #[error("Health check setup error: {0}")]
    HealthCheck(String),

    /// Prometheus collectors could not be registered
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Binding or serving failed
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Owns every long-lived component and wires them together.
///
/// One instance per process. Nothing here is a global, so tests build as many
/// isolated servers as they like.
pub struct SentinelServer {
    config: ServerConfig,
    monitor: Arc<PoolMonitor>,
    aggregator: Arc<SystemHealthAggregator>,
    registry: Arc<ConnectionRegistry>,
    publisher: EventPublisher,
    prometheus: Arc<PrometheusMetrics>,
    sanitizer: LogSanitizer,
    started_at: Instant,
}

impl SentinelServer {
    /// Build a server over a lazily connected Postgres pool
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let sanitizer = LogSanitizer::new();
        info!(
            "Using database {} (max {} connections)",
            sanitizer.sanitize(&config.database.url),
            config.database.max_connections
        );

        let events = PoolEventSink::new();
        let pool = PgConnectionPool::connect_lazy(
            &config.database.url,
            config.database.max_connections,
            config.database.acquire_timeout(),
            events.clone(),
        )
        .map_err(|e| ServerError::Database(sanitizer.sanitize_error(&e)))?;

        let server = Self::with_pool(config, Arc::new(pool))?;
        events.attach(&server.monitor);
        Ok(server)
    }

    /// Build a server over any observed pool
    pub fn with_pool(
        config: ServerConfig,
        pool: Arc<dyn ConnectionPool>,
    ) -> Result<Self, ServerError> {
        let monitor = Arc::new(PoolMonitor::new(pool, config.monitoring.clone()));

        let mut aggregator =
            SystemHealthAggregator::new(env!("CARGO_PKG_VERSION"), config.environment.clone());
        if let Some(timeout) = config.health.check_timeout() {
            aggregator = aggregator.with_check_timeout(timeout);
        }
        register_default_checks(&aggregator, &config, monitor.clone())
            .map_err(|e| ServerError::HealthCheck(e.to_string()))?;

        let registry = Arc::new(ConnectionRegistry::new());
        let prometheus =
            Arc::new(PrometheusMetrics::new().map_err(|e| ServerError::Metrics(e.to_string()))?);

        Ok(Self {
            publisher: EventPublisher::new(registry.clone()),
            config,
            monitor,
            aggregator: Arc::new(aggregator),
            registry,
            prometheus,
            sanitizer: LogSanitizer::new(),
            started_at: Instant::now(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Pool monitor
    pub fn monitor(&self) -> &Arc<PoolMonitor> {
        &self.monitor
    }

    /// Health aggregator
    pub fn aggregator(&self) -> &Arc<SystemHealthAggregator> {
        &self.aggregator
    }

    /// Websocket connection registry
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Event publisher sharing the registry
    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// Every HTTP and websocket route, with request tracing
    pub fn router(&self) -> Router {
        Router::new()
            .merge(create_health_router(
                self.aggregator.clone(),
                self.sanitizer.clone(),
                self.started_at,
            ))
            .merge(create_pool_router(
                self.monitor.clone(),
                self.sanitizer.clone(),
            ))
            .merge(create_metrics_router(
                self.prometheus.clone(),
                self.monitor.clone(),
                self.registry.clone(),
            ))
            .merge(create_websocket_router(
                self.registry.clone(),
                self.config.websocket.clone(),
            ))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until `shutdown` resolves.
    ///
    /// The pool monitor runs for exactly as long as the listener does.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Transport(e.to_string()))?;

        self.monitor.start().await;
        info!("SentinelOps listening on {}", addr);

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await;

        self.monitor.stop().await;
        info!("SentinelOps stopped");
        result.map_err(|e| ServerError::Transport(e.to_string()))
    }

    /// Bind the configured address and serve until Ctrl+C
    pub async fn run(&self) -> Result<(), ServerError> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Transport(format!("Failed to bind {addr}: {e}")))?;
        self.serve(listener, shutdown_signal()).await
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod server_tests;
