//! Integration tests for the pool monitor and the health aggregator together

use crate::test_utils::*;
use sentinelops_monitoring::{
    CheckStatus, ComponentHealth, HealthCheckError, HealthStatus, PoolEvent, PoolMonitor,
    SystemHealthAggregator,
};
use std::sync::Arc;
use std::time::Duration;

fn monitored(pool: Arc<MockPool>) -> Arc<PoolMonitor> {
    Arc::new(PoolMonitor::new(pool, test_monitoring_config()))
}

#[tokio::test]
async fn test_sampler_tracks_live_pool() {
    let pool = Arc::new(MockPool::sized(20));
    pool.set_checked_out(5);
    let monitor = monitored(pool.clone());

    monitor.start().await;
    wait_for_condition(
        || {
            let monitor = monitor.clone();
            async move { monitor.snapshot().active_connections == 5 }
        },
        Duration::from_secs(3),
        Duration::from_millis(50),
    )
    .await
    .unwrap();

    pool.set_checked_out(12);
    wait_for_condition(
        || {
            let monitor = monitor.clone();
            async move { monitor.snapshot().active_connections == 12 }
        },
        Duration::from_secs(5),
        Duration::from_millis(100),
    )
    .await
    .unwrap();

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.idle_connections, 8);
    assert_eq!(snapshot.total_connections, 20);

    monitor.stop().await;
    let calls = pool.state_calls();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(pool.state_calls(), calls, "sampler kept running after stop");
}

#[tokio::test]
async fn test_query_timings_flow_into_health() {
    let pool = Arc::new(MockPool::sized(10));
    let monitor = monitored(pool);

    for secs in [0.1, 0.2, 2.0, 0.05, 1.5] {
        monitor.record_query_time(Duration::from_secs_f64(secs));
    }
    monitor.sample_now().unwrap();
    assert!((monitor.snapshot().avg_query_time - 0.77).abs() < 1e-9);

    let report = monitor.health_check().await;
    assert_eq!(report.status, HealthStatus::Healthy);
    // 2 slow out of 5 is well above the 5% warning rate
    assert_eq!(report.checks.slow_queries.status, CheckStatus::Warn);
    assert_eq!(report.checks.slow_queries.count, 2);
}

#[tokio::test]
async fn test_aggregator_with_monitor_and_failing_check() {
    let pool = Arc::new(MockPool::sized(10));
    let monitor = monitored(pool.clone());

    let aggregator = SystemHealthAggregator::new("0.4.0", "integration");
    aggregator.register("database", monitor.clone());
    aggregator.register(
        "cache",
        Arc::new(|| async {
            Ok::<_, HealthCheckError>(ComponentHealth::degraded("cache", "evicting"))
        }),
    );
    aggregator.register(
        "search",
        Arc::new(|| async { Err::<ComponentHealth, _>(HealthCheckError::failed("index missing")) }),
    );

    let health = aggregator.check_all().await;
    assert_eq!(health.components.len(), 3);
    assert_eq!(health.status, HealthStatus::Unhealthy);
    assert_eq!(
        health.component("database").unwrap().status,
        HealthStatus::Healthy
    );
    let synthetic = health.component("unknown").unwrap();
    assert_eq!(synthetic.metadata["check"], "search");

    aggregator.register(
        "search",
        Arc::new(|| async { Ok::<_, HealthCheckError>(ComponentHealth::healthy("search")) }),
    );
    let health = aggregator.check_all().await;
    assert_eq!(health.status, HealthStatus::Degraded);

    pool.set_probe_fails(true);
    let health = aggregator.check_all().await;
    assert_eq!(health.status, HealthStatus::Unhealthy);
    assert_eq!(monitor.snapshot().failed_connections, 1);
}

#[tokio::test]
async fn test_pool_status_reflects_events() {
    let pool = Arc::new(MockPool::sized(4));
    pool.set_checked_out(1);
    let monitor = monitored(pool);

    for event in [
        PoolEvent::Connect,
        PoolEvent::Checkout,
        PoolEvent::Checkin,
        PoolEvent::Checkout,
    ] {
        monitor.record_event(event);
    }
    monitor.record_connection_time(Duration::from_millis(10));
    monitor.sample_now().unwrap();

    let status = monitor.get_pool_status();
    assert_eq!(status.pool_class, "MockPool");
    assert_eq!(status.connections.active, 1);
    assert_eq!(status.connections.idle, 3);
    assert_eq!(status.events.connects, 1);
    assert_eq!(status.events.checkouts, 2);
    assert_eq!(status.events.checkins, 1);
    assert!((status.performance.avg_connection_time - 0.01).abs() < 1e-9);
}
