//! Component health records and the system health aggregator

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Component name used for results synthesized from a failed check
pub const UNKNOWN_COMPONENT: &str = "unknown";

/// Health status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Fully operational
    Healthy,
    /// Operational with reduced capacity or a warning
    Degraded,
    /// Not operational
    Unhealthy,
}

impl HealthStatus {
    /// Reduce component statuses to one verdict.
    ///
    /// Any unhealthy component makes the whole unhealthy, otherwise any
    /// degraded component makes it degraded. An empty set is healthy.
    pub fn reduce<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = HealthStatus>,
    {
        let mut overall = HealthStatus::Healthy;
        for status in statuses {
            match status {
                HealthStatus::Unhealthy => return HealthStatus::Unhealthy,
                HealthStatus::Degraded => overall = HealthStatus::Degraded,
                HealthStatus::Healthy => {}
            }
        }
        overall
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health of a single component, built fresh on every check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component verdict
    pub status: HealthStatus,
    /// Human-readable detail, usually set when not healthy
    pub message: Option<String>,
    /// When the check produced this result
    pub last_check: DateTime<Utc>,
    /// Free-form details
    pub metadata: Map<String, Value>,
}

impl ComponentHealth {
    /// Component with the given status and no message
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            message: None,
            last_check: Utc::now(),
            metadata: Map::new(),
        }
    }

    /// Healthy component
    pub fn healthy(name: impl Into<String>) -> Self {
        Self::new(name, HealthStatus::Healthy)
    }

    /// Degraded component with a reason
    pub fn degraded(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, HealthStatus::Degraded).with_message(message)
    }

    /// Unhealthy component with a reason
    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, HealthStatus::Unhealthy).with_message(message)
    }

    /// Set the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Add one metadata entry
    pub fn with_metadata<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Whether the status is `Healthy`
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Reduced verdict over every registered component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    /// Worst component status
    pub status: HealthStatus,
    /// When the aggregate was computed
    pub timestamp: DateTime<Utc>,
    /// Service version
    pub version: String,
    /// Deployment environment
    pub environment: String,
    /// Component results in registration order
    pub components: Vec<ComponentHealth>,
    /// Free-form details
    pub metadata: Map<String, Value>,
}

impl SystemHealth {
    /// First component with the given name
    pub fn component(&self, name: &str) -> Option<&ComponentHealth> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// Why a component check produced no result
#[derive(Debug, Error)]
pub enum HealthCheckError {
    /// The check returned an error
    #[error("{0}")]
    Failed(String),

    /// The check exceeded the aggregator's timeout
    #[error("health check timed out after {0:?}")]
    TimedOut(Duration),

    /// The check panicked
    #[error("health check panicked: {0}")]
    Panicked(String),
}

impl HealthCheckError {
    /// Shorthand for [`HealthCheckError::Failed`]
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// A named health probe the aggregator can run.
///
/// Closures returning a future of `Result<ComponentHealth, HealthCheckError>`
/// implement this trait directly.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Run the check once
    async fn check(&self) -> Result<ComponentHealth, HealthCheckError>;
}

#[async_trait]
impl<F, Fut> HealthCheck for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ComponentHealth, HealthCheckError>> + Send + 'static,
{
    async fn check(&self) -> Result<ComponentHealth, HealthCheckError> {
        (self)().await
    }
}

type Registration = (String, Arc<dyn HealthCheck>);

/// Runs every registered check concurrently and reduces the results.
///
/// Checks are kept in registration order; re-registering a name replaces the
/// check in place. A check that errors, panics or times out is reported as an
/// unhealthy component named `unknown` and never aborts the other checks.
pub struct SystemHealthAggregator {
    checks: RwLock<Vec<Registration>>,
    version: String,
    environment: String,
    check_timeout: Option<Duration>,
}

impl SystemHealthAggregator {
    /// Empty aggregator for a service version and environment
    pub fn new(version: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            checks: RwLock::new(Vec::new()),
            version: version.into(),
            environment: environment.into(),
            check_timeout: None,
        }
    }

    /// Bound every check by `timeout`
    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = Some(timeout);
        self
    }

    /// Add or replace a named check
    pub fn register(&self, name: impl Into<String>, check: Arc<dyn HealthCheck>) {
        let name = name.into();
        let mut checks = self.checks.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = checks.iter_mut().find(|(existing, _)| *existing == name) {
            debug!("Replacing health check '{}'", name);
            slot.1 = check;
        } else {
            debug!("Registering health check '{}'", name);
            checks.push((name, check));
        }
    }

    /// Registered check names in order
    pub fn names(&self) -> Vec<String> {
        self.checks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Number of registered checks
    pub fn len(&self) -> usize {
        self.checks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no checks are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every check and reduce to one verdict. Never fails.
    pub async fn check_all(&self) -> SystemHealth {
        let checks: Vec<Registration> = self
            .checks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let timeout = self.check_timeout;
        let components = futures::future::join_all(
            checks
                .iter()
                .map(|(name, check)| run_check(name, check.as_ref(), timeout)),
        )
        .await;

        let status = HealthStatus::reduce(components.iter().map(|c| c.status));
        let healthy = components.iter().filter(|c| c.is_healthy()).count();

        let mut metadata = Map::new();
        metadata.insert("total_components".to_string(), components.len().into());
        metadata.insert("healthy_components".to_string(), healthy.into());

        SystemHealth {
            status,
            timestamp: Utc::now(),
            version: self.version.clone(),
            environment: self.environment.clone(),
            components,
            metadata,
        }
    }
}

async fn run_check(
    name: &str,
    check: &dyn HealthCheck,
    timeout: Option<Duration>,
) -> ComponentHealth {
    let guarded = AssertUnwindSafe(check.check()).catch_unwind();
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, guarded).await {
            Ok(outcome) => outcome,
            Err(_) => Ok(Err(HealthCheckError::TimedOut(limit))),
        },
        None => guarded.await,
    };

    let error = match outcome {
        Ok(Ok(component)) => return component,
        Ok(Err(error)) => error,
        Err(panic) => HealthCheckError::Panicked(panic_message(panic.as_ref())),
    };

    warn!("Health check '{}' failed: {}", name, error);
    ComponentHealth::unhealthy(UNKNOWN_COMPONENT, error.to_string()).with_metadata("check", name)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod health_tests;
