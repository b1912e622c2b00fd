//! SentinelOps API monitoring server
//!
//! This crate assembles the monitoring plane into one HTTP service:
//! - `/health`, `/health/live` and `/ready` backed by the health aggregator
//! - `/health/pool` and `/pool/status` backed by the pool monitor
//! - `/metrics` in Prometheus text format
//! - `/ws` for event subscriptions and `/ws/connections` for introspection
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sentinelops_server::{SentinelServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = SentinelServer::new(ServerConfig::default())?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! Domain code publishes events through [`EventPublisher`], reachable from
//! [`SentinelServer::publisher`].

pub mod checks;
pub mod config;
pub mod events;
pub mod health_endpoint;
pub mod metrics_endpoint;
pub mod pool_endpoint;
pub mod server;
pub mod websocket_endpoint;

#[cfg(test)]
mod test_support;

pub use checks::{
    AgentProcessCheck, CloudConnectivityCheck, LivenessCheck, LoggingCheck,
    register_default_checks,
};
pub use config::{Cli, DatabaseConfig, HealthConfig, ServerConfig};
pub use events::EventPublisher;
pub use metrics_endpoint::PrometheusMetrics;
pub use server::{SentinelServer, ServerError};

// Re-export the component crates for downstream users
pub use sentinelops_logging as logging;
pub use sentinelops_monitoring as monitoring;
pub use sentinelops_transport as transport;
