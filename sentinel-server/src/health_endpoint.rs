//! Health check endpoints for Kubernetes and monitoring

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use sentinelops_logging::LogSanitizer;
use sentinelops_monitoring::{HealthStatus, SystemHealth, SystemHealthAggregator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Liveness response
#[derive(Debug, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always `alive`
    pub status: String,
    /// Seconds since the router was built
    pub uptime_seconds: u64,
}

/// Ready check response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    /// `false` only when the system is unhealthy
    pub ready: bool,
    /// Aggregate status
    pub status: HealthStatus,
    /// Names of unhealthy components, when not ready
    pub message: Option<String>,
}

/// Health check state
pub struct HealthState {
    /// Component checks
    pub aggregator: Arc<SystemHealthAggregator>,
    /// Scrubs messages before they are returned
    pub sanitizer: LogSanitizer,
    /// Reference point for uptime
    pub started_at: Instant,
}

/// Degraded still serves traffic, so only unhealthy maps to 503
pub fn status_code(status: HealthStatus) -> StatusCode {
    match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Scrub credentials out of component messages and metadata
pub fn sanitize_health(mut health: SystemHealth, sanitizer: &LogSanitizer) -> SystemHealth {
    for component in &mut health.components {
        component.message = component.message.as_deref().map(|m| sanitizer.sanitize(m));
        if let Value::Object(metadata) =
            sanitizer.sanitize_context(&Value::Object(std::mem::take(&mut component.metadata)))
        {
            component.metadata = metadata;
        }
    }
    health
}

/// Handler for /health endpoint
pub async fn health_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let health = sanitize_health(state.aggregator.check_all().await, &state.sanitizer);
    (status_code(health.status), Json(health))
}

/// Handler for /health/live endpoint (liveness probe)
pub async fn liveness_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    Json(LivenessResponse {
        status: "alive".to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

/// Handler for /ready endpoint (readiness probe)
pub async fn ready_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let health = state.aggregator.check_all().await;
    let failing: Vec<&str> = health
        .components
        .iter()
        .filter(|c| c.status == HealthStatus::Unhealthy)
        .map(|c| c.name.as_str())
        .collect();

    let response = ReadyResponse {
        ready: health.status != HealthStatus::Unhealthy,
        status: health.status,
        message: (!failing.is_empty()).then(|| format!("unhealthy components: {}", failing.join(", "))),
    };
    (status_code(health.status), Json(response))
}

/// Create health check router
pub fn create_health_router(
    aggregator: Arc<SystemHealthAggregator>,
    sanitizer: LogSanitizer,
    started_at: Instant,
) -> Router {
    let state = Arc::new(HealthState {
        aggregator,
        sanitizer,
        started_at,
    });

    Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/ready", get(ready_handler))
        .with_state(state)
}
