//! Tracing subscriber configuration

use crate::{LoggingError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Encoding of each log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Multi-line human-readable output
    Pretty,
    /// Single-line human-readable output
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(LoggingError::Config(format!(
                "Unknown log format '{other}', expected json, pretty or compact"
            ))),
        }
    }
}

/// Where log lines are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
    /// Daily-rolling files named `<prefix>.<date>` inside `directory`
    File {
        /// Directory the files are created in
        directory: PathBuf,
        /// File name prefix
        prefix: String,
    },
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Line encoding
    pub format: LogFormat,
    /// Where lines are written
    pub output: LogOutput,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            output: LogOutput::Stdout,
        }
    }
}

/// Keeps the background log writer alive; drop it last.
#[must_use = "dropping the guard stops log output"]
pub struct LoggingGuard {
    _worker: WorkerGuard,
}

impl LoggingConfig {
    /// Check the level directive without installing anything
    pub fn validate(&self) -> Result<()> {
        EnvFilter::try_new(&self.level)
            .map(|_| ())
            .map_err(|e| LoggingError::Config(format!("Invalid log level '{}': {e}", self.level)))
    }

    /// Install the global subscriber.
    ///
    /// `RUST_LOG` takes precedence over `level`. Fails if a global subscriber
    /// is already installed.
    pub fn init(&self) -> Result<LoggingGuard> {
        self.validate()?;
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .map_err(|e| LoggingError::Config(format!("Invalid log level: {e}")))?;

        let (writer, worker) = match &self.output {
            LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(std::io::stderr()),
            LogOutput::File { directory, prefix } => {
                probe_output(&self.output)?;
                tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, prefix))
            }
        };

        let installed = match self.format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(writer))
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_writer(writer))
                .try_init(),
            LogFormat::Compact => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(writer))
                .try_init(),
        };
        installed.map_err(|e| LoggingError::Tracing(e.to_string()))?;

        Ok(LoggingGuard { _worker: worker })
    }
}

/// Verify that `output` can accept log lines
pub fn probe_output(output: &LogOutput) -> Result<()> {
    match output {
        LogOutput::Stdout | LogOutput::Stderr => Ok(()),
        LogOutput::File { directory, .. } => probe_directory(directory),
    }
}

fn probe_directory(directory: &Path) -> Result<()> {
    if !directory.is_dir() {
        return Err(LoggingError::Config(format!(
            "Log directory {} does not exist",
            directory.display()
        )));
    }
    // Removed again when dropped
    tempfile::Builder::new()
        .prefix(".sentinelops-probe")
        .tempfile_in(directory)?;
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
