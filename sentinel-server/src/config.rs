//! Server configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `SENTINELOPS_*` environment variables and command-line flags (through
//! [`Cli`], where a flag beats its environment variable).

use crate::server::ServerError;
use clap::Parser;
use sentinelops_logging::{LogFormat, LoggingConfig};
use sentinelops_monitoring::MonitoringConfig;
use sentinelops_transport::WebSocketConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Postgres connection URL
    pub url: String,
    /// Upper bound on open connections
    pub max_connections: u32,
    /// Seconds to wait for a free connection
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://sentinelops@localhost:5432/sentinelops".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
        }
    }
}

impl DatabaseConfig {
    /// Acquire timeout as a `Duration`
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

/// Settings for the default component checks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Upper bound for any single component check; `None` waits forever
    pub check_timeout_secs: Option<u64>,
    /// Endpoint probed by the cloud connectivity check
    pub cloud_endpoint: Option<String>,
    /// Seconds before the cloud request is abandoned
    pub cloud_timeout_secs: u64,
    /// Process name the agent check looks for
    pub agent_process: Option<String>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_timeout_secs: Some(10),
            cloud_endpoint: None,
            cloud_timeout_secs: 5,
            agent_process: None,
        }
    }
}

impl HealthConfig {
    /// Per-check timeout, if any
    pub fn check_timeout(&self) -> Option<Duration> {
        self.check_timeout_secs.map(Duration::from_secs)
    }

    /// Cloud request timeout as a `Duration`
    pub fn cloud_timeout(&self) -> Duration {
        Duration::from_secs(self.cloud_timeout_secs)
    }
}

/// Top-level configuration for the `sentinelops` binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Environment name reported in health responses
    pub environment: String,
    /// Database pool settings
    pub database: DatabaseConfig,
    /// Pool monitor thresholds and intervals
    pub monitoring: MonitoringConfig,
    /// Websocket limits
    pub websocket: WebSocketConfig,
    /// Log level, format and output
    pub logging: LoggingConfig,
    /// Default component checks
    pub health: HealthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            environment: "production".to_string(),
            database: DatabaseConfig::default(),
            monitoring: MonitoringConfig::default(),
            websocket: WebSocketConfig::default(),
            logging: LoggingConfig::default(),
            health: HealthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, ServerError> {
        toml::from_str(contents)
            .map_err(|e| ServerError::Configuration(format!("Invalid configuration file: {e}")))
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ServerError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Configuration(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), ServerError> {
        self.socket_addr()?;
        if self.database.url.trim().is_empty() {
            return Err(ServerError::Configuration(
                "database.url must not be empty".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ServerError::Configuration(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.monitoring.sample_interval_secs == 0 {
            return Err(ServerError::Configuration(
                "monitoring.sample_interval_secs must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.monitoring.saturation_warn_ratio) {
            return Err(ServerError::Configuration(
                "monitoring.saturation_warn_ratio must be between 0 and 1".to_string(),
            ));
        }
        self.websocket
            .validate()
            .map_err(|e| ServerError::Configuration(e.to_string()))?;
        self.logging
            .validate()
            .map_err(|e| ServerError::Configuration(e.to_string()))?;
        Ok(())
    }

    /// Parsed listen address
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                ServerError::Configuration(format!(
                    "Invalid listen address {}:{}: {e}",
                    self.host, self.port
                ))
            })
    }
}

/// Command-line interface of the `sentinelops` binary
#[derive(Debug, Parser)]
#[command(name = "sentinelops")]
#[command(about = "SentinelOps API monitoring server")]
#[command(version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "SENTINELOPS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen address
    #[arg(long, env = "SENTINELOPS_HOST")]
    pub host: Option<String>,

    /// Listen port
    #[arg(short, long, env = "SENTINELOPS_PORT")]
    pub port: Option<u16>,

    /// Deployment environment reported by /health
    #[arg(long, env = "SENTINELOPS_ENVIRONMENT")]
    pub environment: Option<String>,

    /// Postgres connection URL
    #[arg(long, env = "SENTINELOPS_DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Log filter directive, e.g. `info` or `sentinelops_server=debug`
    #[arg(long, env = "SENTINELOPS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// json, pretty or compact
    #[arg(long, env = "SENTINELOPS_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Endpoint probed by the cloud connectivity check
    #[arg(long, env = "SENTINELOPS_CLOUD_ENDPOINT")]
    pub cloud_endpoint: Option<String>,

    /// Process name the agent check looks for
    #[arg(long, env = "SENTINELOPS_AGENT_PROCESS")]
    pub agent_process: Option<String>,
}

impl Cli {
    /// Resolve the final configuration from the file and the overrides
    pub fn load_config(&self) -> Result<ServerConfig, ServerError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overlay every flag that was given onto `config`
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(environment) = &self.environment {
            config.environment = environment.clone();
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(endpoint) = &self.cloud_endpoint {
            config.health.cloud_endpoint = Some(endpoint.clone());
        }
        if let Some(process) = &self.agent_process {
            config.health.agent_process = Some(process.clone());
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
