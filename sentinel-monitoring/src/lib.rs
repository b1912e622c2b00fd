//! Connection-pool monitoring and health aggregation for SentinelOps
//!
//! This crate provides the monitoring plane of the SentinelOps API:
//! - Rolling timing windows for query and connection-acquire latencies
//! - A background sampler that mirrors live pool gauges into a metrics snapshot
//! - A pool health check with saturation and slow-query escalation thresholds
//! - A fan-out aggregator that reduces named component checks to one verdict
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sentinelops_monitoring::{MonitoringConfig, PoolMonitor, SystemHealthAggregator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = Arc::new(my_pool_adapter());
//!     let monitor = Arc::new(PoolMonitor::new(pool, MonitoringConfig::default()));
//!     monitor.start().await;
//!
//!     let aggregator = SystemHealthAggregator::new("0.4.0", "production");
//!     aggregator.register("database", monitor.clone());
//!
//!     let health = aggregator.check_all().await;
//!     println!("overall: {:?}", health.status);
//!
//!     monitor.stop().await;
//! }
//! ```
//!
//! Nothing in this crate is a process-wide singleton. The composition root
//! constructs one `PoolMonitor` and one `SystemHealthAggregator` and injects
//! them where they are needed.

pub mod config;
pub mod health;
pub mod metrics;
pub mod monitor;
pub mod pool;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod report;
pub mod window;

pub use config::MonitoringConfig;
pub use health::{
    ComponentHealth, HealthCheck, HealthCheckError, HealthStatus, SystemHealth,
    SystemHealthAggregator,
};
pub use metrics::{MetricsSnapshot, PoolEvent};
pub use monitor::{PoolEventSink, PoolMonitor};
pub use pool::{ConnectionPool, PoolError, PoolSettings, PoolState};
#[cfg(feature = "postgres")]
pub use postgres::PgConnectionPool;
pub use report::{
    CheckStatus, ConnectionCheck, PoolChecks, PoolHealthReport, PoolStatus, SaturationCheck,
    SlowQueryCheck,
};
pub use window::SampleWindow;

/// Default monitoring configuration
pub fn default_config() -> MonitoringConfig {
    MonitoringConfig::default()
}
