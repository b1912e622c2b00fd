//! Unit tests for the default component checks

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::test_support::StaticPool;
    use axum::{Router, http::StatusCode, routing::get};
    use sentinelops_monitoring::{HealthStatus, MonitoringConfig};
    use std::path::PathBuf;

    /// Serve `status` for `/` on an ephemeral port
    async fn spawn_endpoint(status: StatusCode) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/", get(move || async move { status }));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_liveness() {
        let component = LivenessCheck.check().await.unwrap();
        assert_eq!(component.name, "api");
        assert_eq!(component.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_cloud_unconfigured_is_healthy() {
        let check = CloudConnectivityCheck::new(None, Duration::from_secs(1)).unwrap();
        let component = check.check().await.unwrap();
        assert_eq!(component.status, HealthStatus::Healthy);
        assert_eq!(component.metadata["configured"], false);
    }

    #[tokio::test]
    async fn test_cloud_reachable() {
        let endpoint = spawn_endpoint(StatusCode::OK).await;
        let check = CloudConnectivityCheck::new(Some(endpoint), Duration::from_secs(5)).unwrap();

        let component = check.check().await.unwrap();
        assert_eq!(component.status, HealthStatus::Healthy);
        assert_eq!(component.metadata["status_code"], 200);
        assert!(component.metadata.contains_key("latency_ms"));
    }

    #[tokio::test]
    async fn test_cloud_server_error_degrades() {
        let endpoint = spawn_endpoint(StatusCode::SERVICE_UNAVAILABLE).await;
        let check = CloudConnectivityCheck::new(Some(endpoint), Duration::from_secs(5)).unwrap();

        let component = check.check().await.unwrap();
        assert_eq!(component.status, HealthStatus::Degraded);
        assert_eq!(component.metadata["status_code"], 503);
    }

    #[tokio::test]
    async fn test_cloud_unreachable_is_unhealthy() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let check =
            CloudConnectivityCheck::new(Some(format!("http://{addr}/")), Duration::from_secs(5))
                .unwrap();
        let component = check.check().await.unwrap();
        assert_eq!(component.status, HealthStatus::Unhealthy);
        assert!(component.message.unwrap().contains("unreachable"));
    }

    #[tokio::test]
    async fn test_logging_check() {
        let component = LoggingCheck::new(LogOutput::Stdout).check().await.unwrap();
        assert_eq!(component.status, HealthStatus::Healthy);
        assert_eq!(component.metadata["output"], "stdout");

        let dir = tempfile::tempdir().unwrap();
        let output = LogOutput::File {
            directory: dir.path().to_path_buf(),
            prefix: "api.log".to_string(),
        };
        let component = LoggingCheck::new(output).check().await.unwrap();
        assert_eq!(component.status, HealthStatus::Healthy);

        let output = LogOutput::File {
            directory: PathBuf::from("/nonexistent/sentinelops/logs"),
            prefix: "api.log".to_string(),
        };
        let component = LoggingCheck::new(output).check().await.unwrap();
        assert_eq!(component.status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_agent_check() {
        let component = AgentProcessCheck::default().check().await.unwrap();
        assert_eq!(component.status, HealthStatus::Healthy);

        let check = AgentProcessCheck::new(Some("no-such-agent-process-7f3a".to_string()));
        let component = check.check().await.unwrap();
        assert_eq!(component.status, HealthStatus::Degraded);
        assert_eq!(component.metadata["instances"], 0);
    }

    #[tokio::test]
    async fn test_register_default_checks() {
        let aggregator = SystemHealthAggregator::new("0.4.0", "test");
        let monitor = Arc::new(PoolMonitor::new(
            Arc::new(StaticPool::sized(10)),
            MonitoringConfig::default(),
        ));

        register_default_checks(&aggregator, &ServerConfig::default(), monitor).unwrap();
        assert_eq!(
            aggregator.names(),
            vec!["api", "database", "cloud", "logging", "agent"]
        );

        let health = aggregator.check_all().await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.components.len(), 5);
    }
}
