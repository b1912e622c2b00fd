//! Tests for the Postgres pool adapter

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::MonitoringConfig;
    use crate::monitor::PoolMonitor;
    use std::sync::Arc;

    const UNREACHABLE_URL: &str = "postgres://sentinel@127.0.0.1:1/sentinel";

    fn lazy_pool(events: PoolEventSink) -> PgConnectionPool {
        PgConnectionPool::connect_lazy(UNREACHABLE_URL, 4, Duration::from_millis(200), events)
            .unwrap()
    }

    #[tokio::test]
    async fn test_lazy_pool_reports_gauges_without_connecting() {
        let pool = lazy_pool(PoolEventSink::new());

        assert_eq!(pool.kind(), "PgPool");
        assert_eq!(
            pool.state().unwrap(),
            PoolState {
                checked_out: 0,
                size: 4,
                overflow: 0,
            }
        );
        let settings = pool.settings().unwrap();
        assert_eq!(settings.size, 4);
        assert_eq!(settings.timeout_secs, Some(0.2));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let result = PgConnectionPool::connect_lazy(
            "not a url",
            4,
            Duration::from_secs(1),
            PoolEventSink::new(),
        );
        assert!(matches!(result, Err(PoolError::Introspection(_))));
    }

    #[tokio::test]
    async fn test_failed_acquire_records_no_timing() {
        let events = PoolEventSink::new();
        let pool = Arc::new(lazy_pool(events.clone()));
        let monitor = Arc::new(PoolMonitor::new(pool.clone(), MonitoringConfig::default()));
        assert!(events.attach(&monitor));

        assert!(pool.acquire().await.is_err());
        assert!(pool.probe().await.is_err());
        monitor.sample_now().unwrap();

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.connects, 0);
        assert_eq!(snapshot.checkouts, 0);
        assert_eq!(snapshot.avg_connection_time, 0.0);
    }

    #[tokio::test]
    async fn test_closed_pool_fails_introspection() {
        let pool = lazy_pool(PoolEventSink::new());
        pool.pool().close().await;
        assert!(matches!(pool.state(), Err(PoolError::Closed)));
    }

    #[tokio::test]
    #[ignore] // Requires a Postgres server: set SENTINELOPS_TEST_DATABASE_URL and run with --ignored
    async fn test_lifecycle_hooks_feed_monitor() {
        let url = std::env::var("SENTINELOPS_TEST_DATABASE_URL").unwrap();
        let events = PoolEventSink::new();
        let pool = Arc::new(
            PgConnectionPool::connect_lazy(&url, 2, Duration::from_secs(5), events.clone())
                .unwrap(),
        );
        let monitor = Arc::new(PoolMonitor::new(pool.clone(), MonitoringConfig::default()));
        events.attach(&monitor);

        // First acquire opens a connection, the second reuses it
        drop(pool.acquire().await.unwrap());
        drop(pool.acquire().await.unwrap());
        pool.probe().await.unwrap();
        // Releases run on a background task
        tokio::time::sleep(Duration::from_millis(200)).await;
        monitor.sample_now().unwrap();

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.connects, 1);
        assert_eq!(snapshot.checkouts, 3);
        assert_eq!(snapshot.checkins, 3);
        assert!(snapshot.avg_connection_time > 0.0);
    }
}
