//! Domain event publishing over the websocket registry

use sentinelops_transport::{BroadcastSummary, ConnectionRegistry, ServerMessage};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Publishes domain events to every websocket client subscribed to them.
///
/// Publishing never fails on delivery; clients whose send fails are dropped
/// from the registry and listed in the returned summary.
#[derive(Clone)]
pub struct EventPublisher {
    registry: Arc<ConnectionRegistry>,
}

impl EventPublisher {
    /// Publisher broadcasting through `registry`
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Broadcast `data` as an `event` message to subscribers of `event_type`
    pub async fn publish(&self, event_type: &str, data: Value) -> BroadcastSummary {
        let message = ServerMessage::event(event_type, data);
        let summary = self.registry.broadcast(&message, event_type).await;
        debug!(
            "Published {} to {} clients ({} dropped)",
            event_type,
            summary.delivered,
            summary.failed.len()
        );
        summary
    }

    /// Serialize `payload` and publish it
    pub async fn publish_serialized<T: Serialize>(
        &self,
        event_type: &str,
        payload: &T,
    ) -> Result<BroadcastSummary, serde_json::Error> {
        let data = serde_json::to_value(payload)?;
        Ok(self.publish(event_type, data).await)
    }

    /// Registry events are broadcast through
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}
