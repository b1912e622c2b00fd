//! Integration tests for the SentinelOps monitoring plane
//!
//! This crate contains integration tests that exercise the monitoring,
//! transport, logging and server crates together over real sockets.

#![allow(clippy::uninlined_format_args)] // Allow traditional format strings in tests

pub mod end_to_end_scenarios;
pub mod monitoring_integration;
pub mod websocket_integration;

/// Common test utilities for integration tests
pub mod test_utils {
    use async_trait::async_trait;
    use futures::{SinkExt, StreamExt};
    use sentinelops_monitoring::{
        ConnectionPool, MonitoringConfig, PoolError, PoolSettings, PoolState,
    };
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::net::TcpStream;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

    pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

    /// Pool double with adjustable gauges and probe outcome
    #[derive(Debug, Default)]
    pub struct MockPool {
        pub checked_out: AtomicU32,
        pub size: u32,
        pub probe_fails: AtomicBool,
        pub state_calls: AtomicUsize,
    }

    impl MockPool {
        pub fn sized(size: u32) -> Self {
            Self {
                size,
                ..Default::default()
            }
        }

        pub fn set_checked_out(&self, checked_out: u32) {
            self.checked_out.store(checked_out, Ordering::SeqCst);
        }

        pub fn set_probe_fails(&self, fails: bool) {
            self.probe_fails.store(fails, Ordering::SeqCst);
        }

        pub fn state_calls(&self) -> usize {
            self.state_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConnectionPool for MockPool {
        fn kind(&self) -> &str {
            "MockPool"
        }

        fn state(&self) -> Result<PoolState, PoolError> {
            self.state_calls.fetch_add(1, Ordering::SeqCst);
            Ok(PoolState {
                checked_out: self.checked_out.load(Ordering::SeqCst),
                size: self.size,
                overflow: 0,
            })
        }

        fn settings(&self) -> Option<PoolSettings> {
            Some(PoolSettings {
                size: self.size,
                timeout_secs: Some(30.0),
            })
        }

        async fn probe(&self) -> Result<(), PoolError> {
            if self.probe_fails.load(Ordering::SeqCst) {
                return Err(PoolError::Probe("connection refused".to_string()));
            }
            Ok(())
        }
    }

    /// Create a test-friendly monitoring config
    pub fn test_monitoring_config() -> MonitoringConfig {
        MonitoringConfig {
            sample_interval_secs: 1, // Fast sampling for tests
            error_backoff_secs: 1,
            probe_timeout_secs: 2,
            ..Default::default()
        }
    }

    /// Wait for a condition with timeout
    pub async fn wait_for_condition<F, Fut>(
        mut condition: F,
        timeout_duration: Duration,
        check_interval: Duration,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout_duration {
            if condition().await {
                return Ok(());
            }
            tokio::time::sleep(check_interval).await;
        }
        Err("Condition timeout".into())
    }

    /// Open a websocket client against `url`
    pub async fn ws_connect(url: &str) -> WsClient {
        let (client, _) = tokio_tungstenite::connect_async(url)
            .await
            .expect("websocket handshake failed");
        client
    }

    /// Send a JSON frame
    pub async fn ws_send(client: &mut WsClient, frame: Value) {
        client
            .send(Message::Text(frame.to_string()))
            .await
            .expect("websocket send failed");
    }

    /// Next text frame parsed as JSON, or `None` after five seconds
    pub async fn ws_recv(client: &mut WsClient) -> Option<Value> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let frame = tokio::time::timeout_at(deadline, client.next())
                .await
                .ok()??
                .ok()?;
            match frame {
                Message::Text(text) => return serde_json::from_str(&text).ok(),
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    /// True when no text frame arrives within `window`
    pub async fn ws_silent(client: &mut WsClient, window: Duration) -> bool {
        loop {
            match tokio::time::timeout(window, client.next()).await {
                Err(_) => return true,
                Ok(Some(Ok(Message::Text(_)))) => return false,
                Ok(Some(Ok(_))) => continue,
                Ok(_) => return true,
            }
        }
    }
}
