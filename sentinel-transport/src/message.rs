//! WebSocket message envelope
//!
//! Every server-to-client frame is a JSON object tagged by `type` and stamped
//! with an ISO-8601 UTC `timestamp`. Client frames are tagged by `type` as
//! well and carry an `event_type` for the subscription variants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event types published by the API
pub mod event_types {
    /// An incident was opened
    pub const INCIDENT_CREATED: &str = "incident.created";
    /// An incident changed
    pub const INCIDENT_UPDATED: &str = "incident.updated";
    /// Detection raised a new incident
    pub const INCIDENT_DETECTED: &str = "incident.detected";
    /// A detection rule fired
    pub const DETECTION_TRIGGERED: &str = "detection.triggered";
    /// A detection rule was added
    pub const RULE_CREATED: &str = "rule.created";
    /// A detection rule changed
    pub const RULE_UPDATED: &str = "rule.updated";
    /// An analysis job finished
    pub const ANALYSIS_COMPLETED: &str = "analysis.completed";

    /// Every well-known event type
    pub const ALL: &[&str] = &[
        INCIDENT_CREATED,
        INCIDENT_UPDATED,
        INCIDENT_DETECTED,
        DETECTION_TRIGGERED,
        RULE_CREATED,
        RULE_UPDATED,
        ANALYSIS_COMPLETED,
    ];
}

/// Server-to-client frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Greeting sent once after a client registers
    Connection {
        /// Id the client is registered under
        client_id: String,
        /// Welcome text
        message: String,
        /// Creation time
        timestamp: DateTime<Utc>,
    },
    /// Acknowledges a subscribe or unsubscribe request
    Subscription {
        /// Event type the request named
        event_type: String,
        /// `subscribed` or `unsubscribed`
        status: String,
        /// Creation time
        timestamp: DateTime<Utc>,
    },
    /// Reply to a client ping
    Pong {
        /// Creation time
        timestamp: DateTime<Utc>,
    },
    /// Domain event fanned out to subscribers
    Event {
        /// Event type subscribers registered for
        event_type: String,
        /// Event payload
        data: Value,
        /// Creation time
        timestamp: DateTime<Utc>,
    },
    /// A client frame was rejected
    Error {
        /// Why the frame was rejected
        message: String,
        /// Creation time
        timestamp: DateTime<Utc>,
    },
}

impl ServerMessage {
    /// Greeting sent after the upgrade
    pub fn connection(client_id: impl Into<String>) -> Self {
        Self::Connection {
            client_id: client_id.into(),
            message: "Connected to SentinelOps event stream".to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Subscribe acknowledgement
    pub fn subscribed(event_type: impl Into<String>) -> Self {
        Self::Subscription {
            event_type: event_type.into(),
            status: "subscribed".to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Unsubscribe acknowledgement
    pub fn unsubscribed(event_type: impl Into<String>) -> Self {
        Self::Subscription {
            event_type: event_type.into(),
            status: "unsubscribed".to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Ping reply
    pub fn pong() -> Self {
        Self::Pong {
            timestamp: Utc::now(),
        }
    }

    /// Event payload for subscribers of `event_type`
    pub fn event(event_type: impl Into<String>, data: Value) -> Self {
        Self::Event {
            event_type: event_type.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    /// Rejection notice
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Value of the `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connection",
            Self::Subscription { .. } => "subscription",
            Self::Pong { .. } => "pong",
            Self::Event { .. } => "event",
            Self::Error { .. } => "error",
        }
    }

    /// When the message was created
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Connection { timestamp, .. }
            | Self::Subscription { timestamp, .. }
            | Self::Pong { timestamp }
            | Self::Event { timestamp, .. }
            | Self::Error { timestamp, .. } => *timestamp,
        }
    }

    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Client-to-server frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Start receiving an event type
    Subscribe {
        /// Event type to receive
        event_type: String,
    },
    /// Stop receiving an event type
    Unsubscribe {
        /// Event type to stop receiving
        event_type: String,
    },
    /// Liveness check, answered with `pong`
    Ping,
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod message_tests;
