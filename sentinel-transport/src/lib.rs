//! WebSocket fan-out for SentinelOps
//!
//! This crate owns the live-client side of the event plane:
//! - A JSON message envelope shared by every server-to-client frame
//! - A registry of connected clients with per-event-type subscriber sets
//! - Best-effort broadcast that disconnects clients whose sockets fail
//! - Axum glue that turns an upgraded socket into a registered client
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sentinelops_transport::{ConnectionRegistry, ServerMessage, WebSocketConfig, event_types};
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let registry = Arc::new(ConnectionRegistry::new());
//! let app = sentinelops_transport::websocket::ws_router(registry.clone(), WebSocketConfig::default());
//!
//! // Somewhere in application code
//! let message = ServerMessage::event(event_types::INCIDENT_CREATED, serde_json::json!({"id": 42}));
//! registry.broadcast(&message, event_types::INCIDENT_CREATED).await;
//! # let _ = app;
//! # }
//! ```

pub mod config;
pub mod message;
pub mod registry;
pub mod validation;
pub mod websocket;

use thiserror::Error as ThisError;

pub use config::WebSocketConfig;
pub use message::{ClientMessage, ServerMessage, event_types};
pub use registry::{
    BroadcastSummary, ChannelSink, ClientInfo, ClientSink, ConnectionInfo, ConnectionRegistry,
};

/// Transport errors
#[derive(Debug, ThisError)]
pub enum TransportError {
    /// Invalid configuration
    #[error("Transport configuration error: {0}")]
    Config(String),

    /// A client connection failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// A frame broke the message protocol
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A message could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The client is gone
    #[error("Client connection is closed")]
    Closed,
}

/// Transport result type
pub type Result<T> = std::result::Result<T, TransportError>;
