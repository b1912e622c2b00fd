//! Database pool health and status endpoints

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use sentinelops_logging::LogSanitizer;
use sentinelops_monitoring::{PoolMonitor, PoolStatus};
use std::sync::Arc;

/// State for the pool endpoints
pub struct PoolEndpointState {
    /// Pool monitor
    pub monitor: Arc<PoolMonitor>,
    /// Scrubs probe errors before they are returned
    pub sanitizer: LogSanitizer,
}

/// Handler for /health/pool; 503 only when the live probe fails
pub async fn pool_health_handler(State(state): State<Arc<PoolEndpointState>>) -> impl IntoResponse {
    let mut report = state.monitor.health_check().await;
    if let Some(error) = report.checks.connection.error.take() {
        report.checks.connection.error = Some(state.sanitizer.sanitize(&error));
    }

    let status_code = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(report))
}

/// Handler for /pool/status
pub async fn pool_status_handler(State(state): State<Arc<PoolEndpointState>>) -> Json<PoolStatus> {
    Json(state.monitor.get_pool_status())
}

/// Create pool router
pub fn create_pool_router(monitor: Arc<PoolMonitor>, sanitizer: LogSanitizer) -> Router {
    let state = Arc::new(PoolEndpointState { monitor, sanitizer });

    Router::new()
        .route("/health/pool", get(pool_health_handler))
        .route("/pool/status", get(pool_status_handler))
        .with_state(state)
}
