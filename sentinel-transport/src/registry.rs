//! Registry of live clients and their event subscriptions

use crate::{Result, TransportError, message::ServerMessage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

/// Outbound half of a client connection
#[async_trait]
pub trait ClientSink: Send + Sync {
    /// Whether the underlying transport can still accept frames
    fn is_connected(&self) -> bool;

    /// Deliver one text frame
    async fn send_text(&self, text: String) -> Result<()>;
}

/// Sink backed by a bounded channel drained by the socket writer task.
///
/// A full buffer fails the send instead of waiting, so one stalled client
/// cannot hold up a broadcast.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    /// Sink plus the receiver the socket writer drains
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ClientSink for ChannelSink {
    fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }

    async fn send_text(&self, text: String) -> Result<()> {
        self.tx.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                TransportError::Connection("outbound buffer full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

#[derive(Debug, Clone)]
struct ClientMetadata {
    connected_at: DateTime<Utc>,
    subscriptions: BTreeSet<String>,
}

#[derive(Default)]
struct RegistryState {
    active_connections: HashMap<String, Arc<dyn ClientSink>>,
    subscriptions: HashMap<String, HashSet<String>>,
    client_metadata: HashMap<String, ClientMetadata>,
}

impl RegistryState {
    fn remove_client(&mut self, client_id: &str) -> bool {
        let removed = self.active_connections.remove(client_id).is_some();
        self.client_metadata.remove(client_id);
        self.subscriptions.retain(|_, subscribers| {
            subscribers.remove(client_id);
            !subscribers.is_empty()
        });
        removed
    }
}

/// Per-client view returned by `get_connection_info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client id
    pub client_id: String,
    /// When the client connected
    pub connected_at: DateTime<Utc>,
    /// Subscribed event types, sorted
    pub subscriptions: Vec<String>,
}

/// Read-only snapshot of the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Connected clients
    pub total_connections: usize,
    /// Subscriber count per event type
    pub subscriptions: BTreeMap<String, usize>,
    /// Per-client details
    pub clients: Vec<ClientInfo>,
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastSummary {
    /// Sends that succeeded
    pub delivered: usize,
    /// Clients disconnected because their send failed
    pub failed: Vec<String>,
}

/// Live websocket clients keyed by client id.
///
/// All three maps sit behind one lock, which is never held across a socket
/// write. Sends go through a cloned sink handle after the lock is released.
#[derive(Default)]
pub struct ConnectionRegistry {
    state: RwLock<RegistryState>,
}

impl ConnectionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sink` under `client_id`.
    ///
    /// An existing client with the same id is replaced and starts over with
    /// no subscriptions.
    pub async fn connect(&self, sink: Arc<dyn ClientSink>, client_id: impl Into<String>) {
        let client_id = client_id.into();
        let mut state = self.state.write().await;
        if state.remove_client(&client_id) {
            warn!("Client {} reconnected, replacing previous connection", client_id);
        }
        state.active_connections.insert(client_id.clone(), sink);
        state.client_metadata.insert(
            client_id.clone(),
            ClientMetadata {
                connected_at: Utc::now(),
                subscriptions: BTreeSet::new(),
            },
        );
        info!(
            "Client {} connected ({} active)",
            client_id,
            state.active_connections.len()
        );
    }

    /// Forget a client and every subscription it holds. Unknown ids are ignored.
    pub async fn disconnect(&self, client_id: &str) {
        let mut state = self.state.write().await;
        if state.remove_client(client_id) {
            info!(
                "Client {} disconnected ({} active)",
                client_id,
                state.active_connections.len()
            );
        }
    }

    /// Disconnect `client_id` only while it is still registered with `sink`.
    ///
    /// A session that has been replaced by a reconnect must not tear down its
    /// successor when it closes.
    pub async fn disconnect_session(&self, client_id: &str, sink: &Arc<dyn ClientSink>) {
        let mut state = self.state.write().await;
        let current = state
            .active_connections
            .get(client_id)
            .is_some_and(|registered| Arc::ptr_eq(registered, sink));
        if current && state.remove_client(client_id) {
            info!(
                "Client {} disconnected ({} active)",
                client_id,
                state.active_connections.len()
            );
        }
    }

    /// Returns `false` when the client is not connected
    pub async fn subscribe(&self, client_id: &str, event_type: &str) -> bool {
        let mut state = self.state.write().await;
        let Some(metadata) = state.client_metadata.get_mut(client_id) else {
            return false;
        };
        metadata.subscriptions.insert(event_type.to_string());
        state
            .subscriptions
            .entry(event_type.to_string())
            .or_default()
            .insert(client_id.to_string());
        debug!("Client {} subscribed to {}", client_id, event_type);
        true
    }

    /// Always succeeds; removing an absent subscription is a no-op
    pub async fn unsubscribe(&self, client_id: &str, event_type: &str) -> bool {
        let mut state = self.state.write().await;
        if let Some(subscribers) = state.subscriptions.get_mut(event_type) {
            subscribers.remove(client_id);
            if subscribers.is_empty() {
                state.subscriptions.remove(event_type);
            }
        }
        if let Some(metadata) = state.client_metadata.get_mut(client_id) {
            metadata.subscriptions.remove(event_type);
        }
        debug!("Client {} unsubscribed from {}", client_id, event_type);
        true
    }

    /// Send to one client.
    ///
    /// Unknown ids are ignored. A client whose transport reports it is no
    /// longer connected is disconnected. A failed write is returned to the
    /// caller and leaves the registry untouched.
    pub async fn send_personal_message(
        &self,
        message: &ServerMessage,
        client_id: &str,
    ) -> Result<()> {
        let text = message.to_json()?;
        let sink = {
            let state = self.state.read().await;
            match state.active_connections.get(client_id) {
                Some(sink) => sink.clone(),
                None => return Ok(()),
            }
        };
        self.deliver(client_id, &sink, text).await.map(|_| ())
    }

    /// `Ok(false)` when the client had already gone away
    async fn deliver(
        &self,
        client_id: &str,
        sink: &Arc<dyn ClientSink>,
        text: String,
    ) -> Result<bool> {
        if !sink.is_connected() {
            debug!("Client {} is no longer connected", client_id);
            self.disconnect_session(client_id, sink).await;
            return Ok(false);
        }
        sink.send_text(text).await?;
        Ok(true)
    }

    /// Deliver `message` to every subscriber of `event_type`.
    ///
    /// Subscribers are snapshotted before the fan-out. Clients whose send
    /// fails are disconnected once every send has completed. Never fails.
    pub async fn broadcast(&self, message: &ServerMessage, event_type: &str) -> BroadcastSummary {
        let text = match message.to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to serialize broadcast for {}: {}", event_type, e);
                return BroadcastSummary::default();
            }
        };

        let targets: Vec<(String, Arc<dyn ClientSink>)> = {
            let state = self.state.read().await;
            let Some(subscribers) = state.subscriptions.get(event_type) else {
                return BroadcastSummary::default();
            };
            subscribers
                .iter()
                .filter_map(|id| {
                    state
                        .active_connections
                        .get(id)
                        .map(|sink| (id.clone(), sink.clone()))
                })
                .collect()
        };

        let results = futures::future::join_all(targets.iter().map(|(client_id, sink)| {
            let text = text.clone();
            async move { self.deliver(client_id, sink, text).await }
        }))
        .await;

        let mut summary = BroadcastSummary::default();
        let mut failed = Vec::new();
        for ((client_id, sink), result) in targets.iter().zip(results) {
            match result {
                Ok(true) => summary.delivered += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("Broadcast to client {} failed: {}", client_id, e);
                    failed.push((client_id, sink));
                }
            }
        }

        for (client_id, sink) in failed {
            self.disconnect_session(client_id, sink).await;
            summary.failed.push(client_id.clone());
        }

        debug!(
            "Broadcast {} to {} subscribers ({} failed)",
            event_type,
            summary.delivered,
            summary.failed.len()
        );
        summary
    }

    /// Per-client details plus subscriber counts per event type
    pub async fn get_connection_info(&self) -> ConnectionInfo {
        let state = self.state.read().await;

        let subscriptions = state
            .subscriptions
            .iter()
            .map(|(event_type, subscribers)| (event_type.clone(), subscribers.len()))
            .collect();

        let mut clients: Vec<ClientInfo> = state
            .client_metadata
            .iter()
            .map(|(client_id, metadata)| ClientInfo {
                client_id: client_id.clone(),
                connected_at: metadata.connected_at,
                subscriptions: metadata.subscriptions.iter().cloned().collect(),
            })
            .collect();
        clients.sort_by(|a, b| {
            a.connected_at
                .cmp(&b.connected_at)
                .then_with(|| a.client_id.cmp(&b.client_id))
        });

        ConnectionInfo {
            total_connections: state.active_connections.len(),
            subscriptions,
            clients,
        }
    }

    /// Number of connected clients
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.active_connections.len()
    }

    /// Whether `client_id` is connected
    pub async fn is_connected(&self, client_id: &str) -> bool {
        self.state
            .read()
            .await
            .active_connections
            .contains_key(client_id)
    }

    /// Current subscribers of `event_type`, sorted
    pub async fn subscribers(&self, event_type: &str) -> Vec<String> {
        let state = self.state.read().await;
        let mut subscribers: Vec<String> = state
            .subscriptions
            .get(event_type)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();
        subscribers.sort();
        subscribers
    }

    /// Subscriptions recorded in the client's own metadata
    pub async fn client_subscriptions(&self, client_id: &str) -> Option<BTreeSet<String>> {
        self.state
            .read()
            .await
            .client_metadata
            .get(client_id)
            .map(|m| m.subscriptions.clone())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;
