//! Default component checks registered with the health aggregator

use crate::config::ServerConfig;
use async_trait::async_trait;
use sentinelops_logging::{LogOutput, probe_output};
use sentinelops_monitoring::{
    ComponentHealth, HealthCheck, HealthCheckError, PoolMonitor, SystemHealthAggregator,
    monitor::COMPONENT_NAME,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::System;

/// The API process is up if it can answer at all
#[derive(Debug, Default)]
pub struct LivenessCheck;

#[async_trait]
impl HealthCheck for LivenessCheck {
    async fn check(&self) -> Result<ComponentHealth, HealthCheckError> {
        Ok(ComponentHealth::healthy("api").with_message("API is responding"))
    }
}

/// HEAD request against the configured cloud endpoint.
///
/// An unreachable endpoint is unhealthy, a 5xx answer is degraded and any
/// other answer is healthy. Without an endpoint the check reports healthy.
#[derive(Debug, Clone)]
pub struct CloudConnectivityCheck {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl CloudConnectivityCheck {
    /// Check `endpoint` with a request bounded by `timeout`. `None` disables the check.
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Result<Self, HealthCheckError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HealthCheckError::failed(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl HealthCheck for CloudConnectivityCheck {
    async fn check(&self) -> Result<ComponentHealth, HealthCheckError> {
        let Some(endpoint) = &self.endpoint else {
            return Ok(ComponentHealth::healthy("cloud")
                .with_message("no cloud endpoint configured")
                .with_metadata("configured", false));
        };

        let start = Instant::now();
        let component = match self.client.head(endpoint).send().await {
            Ok(response) => {
                let status = response.status();
                let component = if status.is_server_error() {
                    ComponentHealth::degraded("cloud", format!("cloud endpoint answered {status}"))
                } else {
                    ComponentHealth::healthy("cloud")
                };
                component
                    .with_metadata("status_code", status.as_u16())
                    .with_metadata("latency_ms", start.elapsed().as_millis() as u64)
            }
            Err(e) => ComponentHealth::unhealthy("cloud", format!("cloud endpoint unreachable: {e}")),
        };
        Ok(component.with_metadata("configured", true))
    }
}

/// Verifies the configured log sink still accepts writes
#[derive(Debug, Clone)]
pub struct LoggingCheck {
    output: LogOutput,
}

impl LoggingCheck {
    /// Check the configured log output
    pub fn new(output: LogOutput) -> Self {
        Self { output }
    }
}

#[async_trait]
impl HealthCheck for LoggingCheck {
    async fn check(&self) -> Result<ComponentHealth, HealthCheckError> {
        let sink = match &self.output {
            LogOutput::Stdout => "stdout".to_string(),
            LogOutput::Stderr => "stderr".to_string(),
            LogOutput::File { directory, .. } => directory.display().to_string(),
        };
        let component = match probe_output(&self.output) {
            Ok(()) => ComponentHealth::healthy("logging"),
            Err(e) => ComponentHealth::unhealthy("logging", e.to_string()),
        };
        Ok(component.with_metadata("output", sink))
    }
}

/// Looks for the detection agent among the host's processes.
///
/// A missing agent degrades the system rather than failing it; the API keeps
/// serving without live detections.
#[derive(Debug, Clone, Default)]
pub struct AgentProcessCheck {
    process_name: Option<String>,
}

impl AgentProcessCheck {
    /// Look for `process_name`. `None` disables the check.
    pub fn new(process_name: Option<String>) -> Self {
        Self { process_name }
    }
}

#[async_trait]
impl HealthCheck for AgentProcessCheck {
    async fn check(&self) -> Result<ComponentHealth, HealthCheckError> {
        let Some(name) = self.process_name.clone() else {
            return Ok(ComponentHealth::healthy("agent").with_message("agent process check disabled"));
        };

        let lookup = name.clone();
        let count = tokio::task::spawn_blocking(move || {
            let mut system = System::new();
            system.refresh_processes();
            system.processes_by_name(&lookup).count()
        })
        .await
        .map_err(|e| HealthCheckError::failed(format!("process scan failed: {e}")))?;

        let component = if count > 0 {
            ComponentHealth::healthy("agent")
        } else {
            ComponentHealth::degraded("agent", format!("agent process '{name}' is not running"))
        };
        Ok(component
            .with_metadata("process", name)
            .with_metadata("instances", count))
    }
}

/// Register `api`, `database`, `cloud`, `logging` and `agent`, in that order
pub fn register_default_checks(
    aggregator: &SystemHealthAggregator,
    config: &ServerConfig,
    monitor: Arc<PoolMonitor>,
) -> Result<(), HealthCheckError> {
    aggregator.register("api", Arc::new(LivenessCheck));
    aggregator.register(COMPONENT_NAME, monitor);
    aggregator.register(
        "cloud",
        Arc::new(CloudConnectivityCheck::new(
            config.health.cloud_endpoint.clone(),
            config.health.cloud_timeout(),
        )?),
    );
    aggregator.register(
        "logging",
        Arc::new(LoggingCheck::new(config.logging.output.clone())),
    );
    aggregator.register(
        "agent",
        Arc::new(AgentProcessCheck::new(config.health.agent_process.clone())),
    );
    Ok(())
}

#[cfg(test)]
#[path = "checks_tests.rs"]
mod checks_tests;
