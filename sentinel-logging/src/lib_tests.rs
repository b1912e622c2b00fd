//! Comprehensive unit tests for sentinelops-logging lib module

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_logging_error_display() {
        assert_eq!(
            LoggingError::Config("bad level".to_string()).to_string(),
            "Configuration error: bad level"
        );
        assert_eq!(
            LoggingError::Tracing("already set".to_string()).to_string(),
            "Tracing error: already set"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let error: LoggingError = io.into();
        assert!(matches!(error, LoggingError::Io(_)));
        assert!(error.to_string().contains("read-only"));
    }

    #[test]
    fn test_init_writes_to_rolling_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Compact,
            output: LogOutput::File {
                directory: dir.path().to_path_buf(),
                prefix: "sentinelops.log".to_string(),
            },
        };

        let guard = config.init().unwrap();
        tracing::info!("logging initialized");
        drop(guard);

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("sentinelops.log")
            })
            .collect();
        assert_eq!(files.len(), 1);
    }
}
