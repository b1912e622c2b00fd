//! Unit tests for server configuration loading

#[cfg(test)]
mod tests {
    use super::super::*;
    use sentinelops_logging::LogOutput;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.environment, "production");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.monitoring.sample_interval_secs, 10);
        assert_eq!(config.monitoring.error_backoff_secs, 30);
        assert_eq!(config.monitoring.sample_capacity, 1000);
        assert_eq!(config.monitoring.slow_query_threshold_secs, 1.0);
        assert_eq!(config.monitoring.saturation_warn_ratio, 0.9);
        assert_eq!(config.monitoring.slow_query_warn_rate, 0.05);
        assert_eq!(config.health.check_timeout(), Some(Duration::from_secs(10)));
        assert!(config.health.cloud_endpoint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_toml() {
        let config = ServerConfig::from_toml_str(
            r#"
            host = "127.0.0.1"
            port = 9100
            environment = "staging"

            [database]
            url = "postgres://api:hunter2@db:5432/sentinel"
            max_connections = 25

            [monitoring]
            sample_interval_secs = 5
            slow_query_threshold_secs = 0.5

            [websocket]
            outbound_buffer = 64

            [logging]
            level = "debug"
            format = "compact"
            output = "stderr"

            [health]
            cloud_endpoint = "https://cloud.example.com/ping"
            agent_process = "sentinel-agent"
            "#,
        )
        .unwrap();

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:9100");
        assert_eq!(config.environment, "staging");
        assert_eq!(config.database.max_connections, 25);
        assert_eq!(config.database.acquire_timeout_secs, 30);
        assert_eq!(config.monitoring.sample_interval_secs, 5);
        assert_eq!(config.monitoring.slow_query_threshold_secs, 0.5);
        assert_eq!(config.monitoring.error_backoff_secs, 30);
        assert_eq!(config.websocket.outbound_buffer, 64);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.output, LogOutput::Stderr);
        assert_eq!(
            config.health.agent_process.as_deref(),
            Some("sentinel-agent")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml() {
        let result = ServerConfig::from_toml_str("port = \"not a number\"");
        assert!(matches!(result, Err(ServerError::Configuration(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 8123\n[database]\nmax_connections = 3").unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.port, 8123);
        assert_eq!(config.database.max_connections, 3);

        let missing = ServerConfig::from_file(Path::new("/nonexistent/sentinelops.toml"));
        assert!(matches!(missing, Err(ServerError::Configuration(_))));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = ServerConfig::default();
        config.host = "not a host".to_string();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.database.url = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.monitoring.saturation_warn_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.websocket.outbound_buffer = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.logging.level = "sentinelops=verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 8123\nenvironment = \"staging\"").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = Cli::try_parse_from([
            "sentinelops",
            "--config",
            path.as_str(),
            "--port",
            "9000",
            "--log-format",
            "pretty",
            "--agent-process",
            "sentinel-agent",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.environment, "staging");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(
            config.health.agent_process.as_deref(),
            Some("sentinel-agent")
        );
    }

    #[test]
    fn test_cli_rejects_unknown_log_format() {
        let result = Cli::try_parse_from(["sentinelops", "--log-format", "yaml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_validates_result() {
        let cli =
            Cli::try_parse_from(["sentinelops", "--log-level", "sentinelops=verbose"]).unwrap();
        assert!(matches!(
            cli.load_config(),
            Err(ServerError::Configuration(_))
        ));
    }
}
