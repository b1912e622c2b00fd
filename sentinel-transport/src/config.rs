//! WebSocket configuration

use crate::TransportError;
use serde::{Deserialize, Serialize};

/// WebSocket configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Largest inbound text frame accepted, in bytes
    pub max_message_size: usize,
    /// Outbound frames buffered per client before sends start failing
    pub outbound_buffer: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: 64 * 1024,
            outbound_buffer: 256,
        }
    }
}

impl WebSocketConfig {
    /// Reject zero limits
    pub fn validate(&self) -> Result<(), TransportError> {
        if self.outbound_buffer == 0 {
            return Err(TransportError::Config(
                "outbound_buffer must be at least 1".to_string(),
            ));
        }
        if self.max_message_size == 0 {
            return Err(TransportError::Config(
                "max_message_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
