//! Inbound frame validation

use crate::message::ClientMessage;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Longest event type name a client may subscribe to
pub const MAX_EVENT_TYPE_LEN: usize = 128;

/// Why a client frame was rejected
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Frame exceeds the size limit
    #[error("Message exceeds maximum size: {size} > {max}")]
    MessageTooLarge {
        /// Frame size in bytes
        size: usize,
        /// Configured limit in bytes
        max: usize,
    },

    /// Frame is not a valid client message
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    /// Event type is malformed
    #[error("Invalid event type: {0}")]
    InvalidEventType(String),
}

/// Parse and check a client text frame
pub fn validate_client_frame(
    text: &str,
    max_size: usize,
) -> Result<ClientMessage, ValidationError> {
    if text.len() > max_size {
        return Err(ValidationError::MessageTooLarge {
            size: text.len(),
            max: max_size,
        });
    }

    let message: ClientMessage = serde_json::from_str(text)
        .map_err(|e| ValidationError::InvalidFormat(e.to_string()))?;

    match &message {
        ClientMessage::Subscribe { event_type } | ClientMessage::Unsubscribe { event_type } => {
            validate_event_type(event_type)?;
        }
        ClientMessage::Ping => {}
    }

    Ok(message)
}

/// Non-empty names of at most `MAX_EVENT_TYPE_LEN` characters drawn from ASCII
/// letters, digits and `. _ - : /`, such as `incident.created` or
/// `Incident-Created`
pub fn validate_event_type(event_type: &str) -> Result<(), ValidationError> {
    if event_type.is_empty() || event_type.len() > MAX_EVENT_TYPE_LEN {
        return Err(ValidationError::InvalidEventType(format!(
            "length must be between 1 and {MAX_EVENT_TYPE_LEN}"
        )));
    }
    if !event_type_pattern().is_match(event_type) {
        return Err(ValidationError::InvalidEventType(event_type.to_string()));
    }
    Ok(())
}

fn event_type_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._:/-]+$").expect("valid event type regex")
    })
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod validation_tests;
