//! Unit tests for pool health reports

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::health::HealthStatus;
    use crate::metrics::MetricsSnapshot;
    use crate::pool::{PoolSettings, PoolState};
    use chrono::Utc;

    fn state(checked_out: u32, size: u32) -> PoolState {
        PoolState {
            checked_out,
            size,
            overflow: 0,
        }
    }

    #[test]
    fn test_saturation_threshold_boundaries() {
        assert_eq!(saturation_status(0.899999, 0.9), CheckStatus::Pass);
        assert_eq!(saturation_status(0.9, 0.9), CheckStatus::Warn);
        assert_eq!(saturation_status(1.0, 0.9), CheckStatus::Warn);
        assert_eq!(saturation_status(0.0, 0.9), CheckStatus::Pass);
    }

    #[test]
    fn test_saturation_nine_of_ten_warns() {
        let check = SaturationCheck::evaluate(state(9, 10), 0.9);
        assert_eq!(check.status, CheckStatus::Warn);
        assert_eq!(check.active, 9);
        assert_eq!(check.size, 10);
        assert!((check.utilization - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_saturation_unsized_pool_passes() {
        let check = SaturationCheck::evaluate(state(0, 0), 0.9);
        assert_eq!(check.status, CheckStatus::Pass);
        assert_eq!(check.utilization, 0.0);
    }

    #[test]
    fn test_slow_query_rate() {
        let check = SlowQueryCheck::evaluate(1, 100, 0.05);
        assert_eq!(check.status, CheckStatus::Pass);
        assert_eq!(check.count, 1);

        let check = SlowQueryCheck::evaluate(5, 100, 0.05);
        assert_eq!(check.status, CheckStatus::Warn);

        let check = SlowQueryCheck::evaluate(2, 5, 0.05);
        assert_eq!(check.status, CheckStatus::Warn);
        assert!((check.rate - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_slow_query_empty_window_passes() {
        let check = SlowQueryCheck::evaluate(0, 0, 0.05);
        assert_eq!(check.status, CheckStatus::Pass);
        assert_eq!(check.rate, 0.0);
    }

    #[test]
    fn test_connection_check_constructors() {
        let ok = ConnectionCheck::pass(0.002);
        assert!(ok.passed());
        assert!(ok.error.is_none());

        let failed = ConnectionCheck::fail("refused");
        assert!(!failed.passed());
        assert_eq!(failed.error.as_deref(), Some("refused"));
        assert!(failed.response_time.is_none());
    }

    #[test]
    fn test_report_warnings_and_serialization() {
        let report = PoolHealthReport {
            status: HealthStatus::Healthy,
            timestamp: Utc::now(),
            checks: PoolChecks {
                connection: ConnectionCheck::pass(0.01),
                pool_saturation: SaturationCheck::evaluate(state(10, 10), 0.9),
                slow_queries: SlowQueryCheck::evaluate(0, 10, 0.05),
            },
        };

        assert!(report.is_healthy());
        assert_eq!(report.warnings(), vec!["pool_saturation"]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["checks"]["pool_saturation"]["status"], "warn");
        assert_eq!(json["checks"]["connection"]["status"], "pass");
        assert!(json["checks"]["connection"].get("error").is_none());
    }

    #[test]
    fn test_pool_status_groups_snapshot() {
        let snapshot = MetricsSnapshot {
            active_connections: 3,
            idle_connections: 7,
            total_connections: 10,
            failed_connections: 1,
            checkouts: 42,
            slow_queries: 2,
            ..Default::default()
        };
        let settings = PoolSettings {
            size: 10,
            timeout_secs: Some(30.0),
        };

        let status = PoolStatus::from_snapshot("PgPool", &snapshot, Some(settings.clone()));
        assert_eq!(status.pool_class, "PgPool");
        assert_eq!(status.connections.active, 3);
        assert_eq!(status.connections.idle, 7);
        assert_eq!(status.connections.failed, 1);
        assert_eq!(status.events.checkouts, 42);
        assert_eq!(status.performance.slow_queries, 2);
        assert_eq!(status.config, Some(settings));
    }

    #[test]
    fn test_pool_status_without_config_omits_field() {
        let status = PoolStatus::from_snapshot("Mock", &MetricsSnapshot::default(), None);
        let json = serde_json::to_value(&status).unwrap();
        assert!(json.get("config").is_none());
        assert_eq!(json["pool_class"], "Mock");
    }
}
