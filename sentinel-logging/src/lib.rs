//! Logging setup for SentinelOps services
//!
//! - Installs a `tracing` subscriber in json, pretty or compact format
//! - Writes to stdout, stderr or daily-rolling files without blocking callers
//! - Scrubs credentials from messages before they reach logs or HTTP responses
//!
//! # Example
//!
//! ```rust,no_run
//! use sentinelops_logging::{LogSanitizer, LoggingConfig};
//!
//! let _guard = LoggingConfig::default().init().expect("Failed to initialize logging");
//!
//! let sanitizer = LogSanitizer::new();
//! tracing::info!(url = %sanitizer.sanitize("postgres://app:hunter2@db/sentinel"), "connecting");
//! ```

pub mod config;
pub mod sanitization;

pub use config::{LogFormat, LogOutput, LoggingConfig, LoggingGuard, probe_output};
pub use sanitization::{LogSanitizer, SanitizationConfig, is_sensitive_field};

/// Result type for logging operations
pub type Result<T> = std::result::Result<T, LoggingError>;

/// Logging error types
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Invalid logging configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Log output could not be opened or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The global subscriber could not be installed
    #[error("Tracing error: {0}")]
    Tracing(String),
}

#[cfg(test)]
mod lib_tests;
