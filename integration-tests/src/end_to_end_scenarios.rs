//! End-to-end scenarios against a fully assembled SentinelOps server

use crate::test_utils::*;
use clap::Parser;
use sentinelops_server::{Cli, SentinelServer, ServerConfig};
use sentinelops_transport::event_types;
use serde_json::{Value, json};
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct RunningServer {
    server: Arc<SentinelServer>,
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), sentinelops_server::ServerError>>,
}

impl RunningServer {
    async fn start(config: ServerConfig, pool: Arc<MockPool>) -> Self {
        let server = Arc::new(SentinelServer::with_pool(config, pool).unwrap());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown, signal) = oneshot::channel::<()>();

        let handle = {
            let server = server.clone();
            tokio::spawn(async move {
                server
                    .serve(listener, async {
                        let _ = signal.await;
                    })
                    .await
            })
        };

        let running = Self {
            server,
            addr,
            shutdown,
            handle,
        };
        running.wait_until_live().await;
        running
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn wait_until_live(&self) {
        let url = self.url("/health/live");
        wait_for_condition(
            || {
                let url = url.clone();
                async move { reqwest::get(&url).await.is_ok() }
            },
            Duration::from_secs(5),
            Duration::from_millis(20),
        )
        .await
        .unwrap();
    }

    async fn get_json(&self, path: &str) -> (reqwest::StatusCode, Value) {
        let response = reqwest::get(self.url(path)).await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    async fn stop(self) {
        self.shutdown.send(()).unwrap();
        self.handle.await.unwrap().unwrap();
        assert!(!self.server.monitor().is_running().await);
    }
}

fn test_config() -> ServerConfig {
    ServerConfig {
        environment: "integration".to_string(),
        monitoring: test_monitoring_config(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_health_surface() {
    let pool = Arc::new(MockPool::sized(10));
    pool.set_checked_out(9);
    let running = RunningServer::start(test_config(), pool.clone()).await;

    let (status, health) = running.get_json("/health").await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["environment"], "integration");
    assert_eq!(health["components"].as_array().unwrap().len(), 5);

    let (status, pool_health) = running.get_json("/health/pool").await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(pool_health["checks"]["pool_saturation"]["status"], "warn");

    pool.set_probe_fails(true);
    let (status, health) = running.get_json("/health").await;
    assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");

    let (status, ready) = running.get_json("/ready").await;
    assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(ready["ready"], false);

    running.stop().await;
}

#[tokio::test]
async fn test_published_event_reaches_websocket_subscriber() {
    let running = RunningServer::start(test_config(), Arc::new(MockPool::sized(10))).await;

    let mut analyst = ws_connect(&format!("ws://{}/ws?client_id=analyst-1", running.addr)).await;
    assert_eq!(ws_recv(&mut analyst).await.unwrap()["type"], "connection");
    ws_send(
        &mut analyst,
        json!({"type": "subscribe", "event_type": event_types::INCIDENT_CREATED}),
    )
    .await;
    assert_eq!(ws_recv(&mut analyst).await.unwrap()["type"], "subscription");

    let (_, info) = running.get_json("/ws/connections").await;
    assert_eq!(info["total_connections"], 1);
    assert_eq!(info["subscriptions"][event_types::INCIDENT_CREATED], 1);

    let summary = running
        .server
        .publisher()
        .publish(
            event_types::INCIDENT_CREATED,
            json!({"incident_id": 5150, "title": "Suspicious login burst"}),
        )
        .await;
    assert_eq!(summary.delivered, 1);

    let event = ws_recv(&mut analyst).await.unwrap();
    assert_eq!(event["type"], "event");
    assert_eq!(event["event_type"], event_types::INCIDENT_CREATED);
    assert_eq!(event["data"]["incident_id"], 5150);

    let metrics = reqwest::get(running.url("/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("sentinelops_websocket_connections 1"));

    analyst.close(None).await.unwrap();
    running.stop().await;
}

#[tokio::test]
async fn test_sampler_runs_while_serving() {
    let pool = Arc::new(MockPool::sized(10));
    pool.set_checked_out(3);
    let running = RunningServer::start(test_config(), pool.clone()).await;

    wait_for_condition(
        || {
            let running = &running;
            async move {
                let (_, status) = running.get_json("/pool/status").await;
                status["connections"]["active"] == 3
            }
        },
        Duration::from_secs(5),
        Duration::from_millis(100),
    )
    .await
    .unwrap();

    running.stop().await;
    let calls = pool.state_calls();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(pool.state_calls(), calls);
}

#[tokio::test]
async fn test_config_file_drives_server() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "environment = \"from-file\"\n[monitoring]\nsample_interval_secs = 1\n[websocket]\nmax_message_size = 512"
    )
    .unwrap();
    let path = file.path().to_string_lossy().to_string();

    let cli = Cli::try_parse_from(["sentinelops", "--config", path.as_str(), "--port", "0"])
        .unwrap();
    let config = cli.load_config().unwrap();
    assert_eq!(config.environment, "from-file");
    assert_eq!(config.websocket.max_message_size, 512);

    let running = RunningServer::start(config, Arc::new(MockPool::sized(10))).await;
    let (_, health) = running.get_json("/health").await;
    assert_eq!(health["environment"], "from-file");
    running.stop().await;
}
