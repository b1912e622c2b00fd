//! Websocket upgrade and connection introspection endpoints

use axum::{Router, extract::State, response::Json, routing::get};
use sentinelops_transport::{ConnectionInfo, ConnectionRegistry, WebSocketConfig, websocket::ws_router};
use std::sync::Arc;

/// Handler for /ws/connections
pub async fn connections_handler(
    State(registry): State<Arc<ConnectionRegistry>>,
) -> Json<ConnectionInfo> {
    Json(registry.get_connection_info().await)
}

/// `GET /ws` plus `GET /ws/connections`
pub fn create_websocket_router(registry: Arc<ConnectionRegistry>, config: WebSocketConfig) -> Router {
    Router::new()
        .route("/ws/connections", get(connections_handler))
        .with_state(registry.clone())
        .merge(ws_router(registry, config))
}
