//! Websocket fan-out over real sockets

use crate::test_utils::*;
use sentinelops_transport::{
    ConnectionRegistry, ServerMessage, WebSocketConfig, event_types, websocket::ws_router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

async fn spawn_ws_server(config: WebSocketConfig) -> (Arc<ConnectionRegistry>, SocketAddr) {
    let registry = Arc::new(ConnectionRegistry::new());
    let app = ws_router(registry.clone(), config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (registry, addr)
}

async fn connect_client(addr: SocketAddr, client_id: &str) -> WsClient {
    let mut client = ws_connect(&format!("ws://{addr}/ws?client_id={client_id}")).await;
    let greeting = ws_recv(&mut client).await.unwrap();
    assert_eq!(greeting["type"], "connection");
    assert_eq!(greeting["client_id"], client_id);
    client
}

async fn subscribe(client: &mut WsClient, event_type: &str) {
    ws_send(client, json!({"type": "subscribe", "event_type": event_type})).await;
    let ack = ws_recv(client).await.unwrap();
    assert_eq!(ack["type"], "subscription");
    assert_eq!(ack["status"], "subscribed");
    assert_eq!(ack["event_type"], event_type);
}

#[tokio::test]
async fn test_broadcast_reaches_both_subscribers() {
    let (registry, addr) = spawn_ws_server(WebSocketConfig::default()).await;
    let mut x = connect_client(addr, "x").await;
    let mut y = connect_client(addr, "y").await;
    subscribe(&mut x, event_types::INCIDENT_DETECTED).await;
    subscribe(&mut y, event_types::INCIDENT_DETECTED).await;

    let message = ServerMessage::event(
        event_types::INCIDENT_DETECTED,
        json!({"incident_id": 101, "severity": "critical"}),
    );
    let summary = registry
        .broadcast(&message, event_types::INCIDENT_DETECTED)
        .await;
    assert_eq!(summary.delivered, 2);

    let from_x = ws_recv(&mut x).await.unwrap();
    let from_y = ws_recv(&mut y).await.unwrap();
    assert_eq!(from_x, from_y);
    assert_eq!(from_x["type"], "event");
    assert!(from_x["timestamp"].is_string());
    assert_eq!(from_x["data"]["incident_id"], 101);

    // Exactly one copy each
    assert!(ws_silent(&mut x, Duration::from_millis(200)).await);
    assert!(ws_silent(&mut y, Duration::from_millis(200)).await);
}

#[tokio::test]
async fn test_unsubscribed_client_receives_nothing() {
    let (registry, addr) = spawn_ws_server(WebSocketConfig::default()).await;
    let mut x = connect_client(addr, "x").await;
    subscribe(&mut x, event_types::RULE_CREATED).await;

    ws_send(
        &mut x,
        json!({"type": "unsubscribe", "event_type": event_types::RULE_CREATED}),
    )
    .await;
    let ack = ws_recv(&mut x).await.unwrap();
    assert_eq!(ack["status"], "unsubscribed");

    let summary = registry
        .broadcast(
            &ServerMessage::event(event_types::RULE_CREATED, json!({})),
            event_types::RULE_CREATED,
        )
        .await;
    assert_eq!(summary.delivered, 0);
    assert!(ws_silent(&mut x, Duration::from_millis(200)).await);
}

#[tokio::test]
async fn test_ping_and_bad_frames() {
    let (_, addr) = spawn_ws_server(WebSocketConfig {
        max_message_size: 256,
        ..Default::default()
    })
    .await;
    let mut client = connect_client(addr, "pinger").await;

    ws_send(&mut client, json!({"type": "ping"})).await;
    assert_eq!(ws_recv(&mut client).await.unwrap()["type"], "pong");

    futures::SinkExt::send(&mut client, Message::Text("{not json".to_string()))
        .await
        .unwrap();
    assert_eq!(ws_recv(&mut client).await.unwrap()["type"], "error");

    ws_send(
        &mut client,
        json!({"type": "subscribe", "event_type": "x".repeat(400)}),
    )
    .await;
    assert_eq!(ws_recv(&mut client).await.unwrap()["type"], "error");

    // The session survives bad frames
    ws_send(&mut client, json!({"type": "ping"})).await;
    assert_eq!(ws_recv(&mut client).await.unwrap()["type"], "pong");
}

#[tokio::test]
async fn test_generated_client_id() {
    let (registry, addr) = spawn_ws_server(WebSocketConfig::default()).await;
    let mut client = ws_connect(&format!("ws://{addr}/ws")).await;
    let greeting = ws_recv(&mut client).await.unwrap();
    let client_id = greeting["client_id"].as_str().unwrap().to_string();
    assert!(!client_id.is_empty());
    assert!(registry.is_connected(&client_id).await);
}

#[tokio::test]
async fn test_close_removes_client_and_subscriptions() {
    let (registry, addr) = spawn_ws_server(WebSocketConfig::default()).await;
    let mut x = connect_client(addr, "x").await;
    subscribe(&mut x, event_types::INCIDENT_CREATED).await;
    assert_eq!(registry.connection_count().await, 1);

    x.close(None).await.unwrap();
    drop(x);

    wait_for_condition(
        || {
            let registry = registry.clone();
            async move { registry.connection_count().await == 0 }
        },
        Duration::from_secs(5),
        Duration::from_millis(50),
    )
    .await
    .unwrap();
    assert!(
        registry
            .subscribers(event_types::INCIDENT_CREATED)
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn test_reconnect_keeps_newest_session() {
    let (registry, addr) = spawn_ws_server(WebSocketConfig::default()).await;
    let mut first = connect_client(addr, "dup").await;
    subscribe(&mut first, event_types::INCIDENT_CREATED).await;

    let mut second = connect_client(addr, "dup").await;
    first.close(None).await.unwrap();
    drop(first);

    // Give the first session time to run its cleanup
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(registry.is_connected("dup").await);
    assert!(
        registry
            .subscribers(event_types::INCIDENT_CREATED)
            .await
            .is_empty()
    );

    subscribe(&mut second, event_types::INCIDENT_CREATED).await;
    let summary = registry
        .broadcast(
            &ServerMessage::event(event_types::INCIDENT_CREATED, json!({"incident_id": 7})),
            event_types::INCIDENT_CREATED,
        )
        .await;
    assert_eq!(summary.delivered, 1);
    assert_eq!(ws_recv(&mut second).await.unwrap()["data"]["incident_id"], 7);
}
