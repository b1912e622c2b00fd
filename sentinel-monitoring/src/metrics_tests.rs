//! Unit tests for the metrics snapshot

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_default_is_zeroed() {
        let snapshot = MetricsSnapshot::default();
        assert_eq!(snapshot.active_connections, 0);
        assert_eq!(snapshot.failed_connections, 0);
        assert_eq!(snapshot.avg_query_time, 0.0);
        assert_eq!(snapshot.uptime_seconds, 0.0);
    }

    #[test]
    fn test_apply_counts_each_event() {
        let mut snapshot = MetricsSnapshot::default();
        for event in [
            PoolEvent::Connect,
            PoolEvent::Checkout,
            PoolEvent::Checkout,
            PoolEvent::Checkin,
            PoolEvent::Disconnect,
            PoolEvent::Checkout,
        ] {
            snapshot.apply(event);
        }

        assert_eq!(snapshot.connects, 1);
        assert_eq!(snapshot.checkouts, 3);
        assert_eq!(snapshot.checkins, 1);
        assert_eq!(snapshot.disconnects, 1);
    }

    #[test]
    fn test_event_serialization() {
        assert_eq!(
            serde_json::to_string(&PoolEvent::Checkout).unwrap(),
            "\"checkout\""
        );
        let event: PoolEvent = serde_json::from_str("\"disconnect\"").unwrap();
        assert_eq!(event, PoolEvent::Disconnect);
    }

    #[test]
    fn test_snapshot_serializes_all_fields() {
        let json = serde_json::to_value(MetricsSnapshot::default()).unwrap();
        for field in [
            "active_connections",
            "idle_connections",
            "total_connections",
            "overflow_connections",
            "avg_connection_time",
            "avg_query_time",
            "slow_queries",
            "failed_connections",
            "checkouts",
            "checkins",
            "connects",
            "disconnects",
            "last_updated",
            "uptime_seconds",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
    }
}
