//! Secret scrubbing for log lines and operator-facing messages
//!
//! Health-check messages and database URLs routinely carry credentials (a
//! connection string in a driver error, a bearer token echoed by a proxy).
//! Everything that leaves the process through a log line or an HTTP health
//! response passes through `LogSanitizer` first.

use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::OnceLock;

struct Patterns {
    url_credentials: Regex,
    password: Regex,
    token: Regex,
    bearer: Regex,
    api_key: Regex,
    secret: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        url_credentials: Regex::new(r"(?i)\b([a-z][a-z0-9+.\-]*://)([^:/@\s]+):([^@/\s]+)@")
            .expect("Invalid URL credential regex"),
        password: Regex::new(
            r#"(?i)((?:password|passwd|pwd|pass)["']?\s*[=:]\s*["'`]?)([^'"`\s,}&]+)"#,
        )
        .expect("Invalid password regex"),
        token: Regex::new(r#"(?i)(token["']?\s*[=:]\s*["']?)([A-Za-z0-9._\-]+)"#)
            .expect("Invalid token regex"),
        bearer: Regex::new(r"(?i)(bearer\s+)([A-Za-z0-9._\-~+/]+=*)")
            .expect("Invalid bearer regex"),
        api_key: Regex::new(r#"(?i)((?:api[_-]?key|apikey)["']?\s*[=:]\s*["']?)([A-Za-z0-9._\-]+)"#)
            .expect("Invalid API key regex"),
        secret: Regex::new(
            r#"(?i)((?:secret|credentials?)["']?\s*[=:]\s*["']?)([^'"\s,}&]+)"#,
        )
        .expect("Invalid secret regex"),
    })
}

/// Sanitization configuration
#[derive(Debug, Clone)]
pub struct SanitizationConfig {
    /// Mask sensitive values; when `false` messages pass through untouched
    pub enabled: bool,
    /// Replacement string for sensitive values
    pub replacement: String,
}

impl Default for SanitizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            replacement: "[REDACTED]".to_string(),
        }
    }
}

/// Masks passwords, tokens, API keys, secrets and URL credentials
#[derive(Debug, Clone, Default)]
pub struct LogSanitizer {
    config: SanitizationConfig,
}

impl LogSanitizer {
    /// Sanitizer with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitizer with an explicit configuration
    pub fn with_config(config: SanitizationConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &SanitizationConfig {
        &self.config
    }

    /// Mask credentials, tokens and secrets in a message
    pub fn sanitize(&self, message: &str) -> String {
        if !self.config.enabled {
            return message.to_string();
        }

        let patterns = patterns();
        let replacement = self.config.replacement.as_str();

        let sanitized = patterns
            .url_credentials
            .replace_all(message, |caps: &Captures| {
                format!("{}{}:{}@", &caps[1], &caps[2], replacement)
            });

        let mut sanitized = sanitized.into_owned();
        for regex in [
            &patterns.password,
            &patterns.token,
            &patterns.bearer,
            &patterns.api_key,
            &patterns.secret,
        ] {
            sanitized = regex
                .replace_all(&sanitized, |caps: &Captures| {
                    format!("{}{}", &caps[1], replacement)
                })
                .into_owned();
        }
        sanitized
    }

    /// Sanitized `Display` form of an error
    pub fn sanitize_error(&self, error: &dyn std::error::Error) -> String {
        self.sanitize(&error.to_string())
    }

    /// Sanitize string values and blank out values under sensitive keys
    pub fn sanitize_context(&self, context: &Value) -> Value {
        if !self.config.enabled {
            return context.clone();
        }

        match context {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| {
                        let value = if is_sensitive_field(key) {
                            Value::String(self.config.replacement.clone())
                        } else {
                            self.sanitize_context(value)
                        };
                        (key.clone(), value)
                    })
                    .collect(),
            ),
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.sanitize_context(v)).collect())
            }
            Value::String(s) => Value::String(self.sanitize(s)),
            other => other.clone(),
        }
    }
}

/// Whether a field name indicates sensitive data
pub fn is_sensitive_field(field_name: &str) -> bool {
    let lower = field_name.to_lowercase();
    matches!(
        lower.as_str(),
        "pass" | "pwd" | "key" | "auth" | "authorization"
    ) || [
        "password",
        "passwd",
        "token",
        "secret",
        "api_key",
        "apikey",
        "credential",
        "bearer",
        "private_key",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
}

#[cfg(test)]
#[path = "sanitization_tests.rs"]
mod sanitization_tests;
