//! Axum websocket endpoint feeding the connection registry

use crate::{
    config::WebSocketConfig,
    message::{ClientMessage, ServerMessage},
    registry::{ChannelSink, ClientSink, ConnectionRegistry},
    validation::validate_client_frame,
};
use axum::{
    Router,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Shared state for the websocket route
#[derive(Clone)]
pub struct WsState {
    /// Registry sessions are added to
    pub registry: Arc<ConnectionRegistry>,
    /// Frame and buffer limits
    pub config: WebSocketConfig,
}

/// Query parameters for the upgrade request
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Client id to register under; generated when absent
    pub client_id: Option<String>,
}

/// Router exposing `GET /ws`
pub fn ws_router(registry: Arc<ConnectionRegistry>, config: WebSocketConfig) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(WsState { registry, config })
}

/// Upgrade handler; a client id is generated when none is supplied
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<WsState>,
) -> impl IntoResponse {
    let client_id = query
        .client_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    ws.on_upgrade(move |socket| serve_socket(socket, client_id, state.registry, state.config))
}

/// Drive one client connection until either side closes it
pub async fn serve_socket(
    socket: WebSocket,
    client_id: String,
    registry: Arc<ConnectionRegistry>,
    config: WebSocketConfig,
) {
    let (mut socket_tx, mut socket_rx) = socket.split();
    let (sink, mut outbound) = ChannelSink::new(config.outbound_buffer);
    let sink: Arc<dyn ClientSink> = Arc::new(sink);

    let writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if let Err(e) = socket_tx.send(Message::Text(text)).await {
                debug!("Websocket write failed: {}", e);
                break;
            }
        }
        let _ = socket_tx.close().await;
    });

    registry.connect(sink.clone(), client_id.clone()).await;
    reply(&sink, &client_id, ServerMessage::connection(&client_id)).await;

    while let Some(frame) = socket_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let response =
                    handle_client_message(&registry, &client_id, &text, config.max_message_size)
                        .await;
                reply(&sink, &client_id, response).await;
            }
            Ok(Message::Binary(_)) => {
                reply(
                    &sink,
                    &client_id,
                    ServerMessage::error("binary frames are not supported"),
                )
                .await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Websocket read error for client {}: {}", client_id, e);
                break;
            }
        }
    }

    registry.disconnect_session(&client_id, &sink).await;
    drop(sink);
    if let Err(e) = writer.await {
        warn!("Websocket writer for client {} ended abnormally: {}", client_id, e);
    }
}

/// Answer one inbound text frame
pub async fn handle_client_message(
    registry: &ConnectionRegistry,
    client_id: &str,
    text: &str,
    max_message_size: usize,
) -> ServerMessage {
    let message = match validate_client_frame(text, max_message_size) {
        Ok(message) => message,
        Err(e) => {
            debug!("Rejected frame from client {}: {}", client_id, e);
            return ServerMessage::error(e.to_string());
        }
    };

    match message {
        ClientMessage::Subscribe { event_type } => {
            if registry.subscribe(client_id, &event_type).await {
                ServerMessage::subscribed(event_type)
            } else {
                ServerMessage::error(format!("client {client_id} is not connected"))
            }
        }
        ClientMessage::Unsubscribe { event_type } => {
            registry.unsubscribe(client_id, &event_type).await;
            ServerMessage::unsubscribed(event_type)
        }
        ClientMessage::Ping => ServerMessage::pong(),
    }
}

/// Replies go to this session's own sink, so they never reach a newer
/// connection that took over the same client id.
async fn reply(sink: &Arc<dyn ClientSink>, client_id: &str, message: ServerMessage) {
    let text = match message.to_json() {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to serialize reply for client {}: {}", client_id, e);
            return;
        }
    };
    if let Err(e) = sink.send_text(text).await {
        debug!("Reply to client {} dropped: {}", client_id, e);
    }
}

#[cfg(test)]
#[path = "websocket_tests.rs"]
mod websocket_tests;
