// Loading wrike-tools.yaml from disk, with ${VAR} / ${VAR:default}
// expansion against the process environment.

#[cfg(test)]
mod test {

    use std::io::Write;

    use serial_test::serial;
    use tempfile::NamedTempFile;

    use crate::config::settings::LogFormat;
    use crate::utils::config_loader;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write config");
        file
    }

    #[tokio::test]
    #[serial]
    async fn file_values_and_env_placeholders_are_applied() {
        std::env::set_var("WT_CFG_TOKEN_URL", "http://127.0.0.1:9999/oauth2/token");
        std::env::remove_var("WT_CFG_PORT");

        let file = write_config(
            r#"
settings:
  server:
    host: 0.0.0.0
    port: "${WT_CFG_PORT:9090}"
  metrics:
    is_enabled: true
    path: /internal/metrics
  logging:
    level: warn
    format: json
wrike:
  token_url: ${WT_CFG_TOKEN_URL}
  scopes: [Default, wsReadOnly]
cache:
  user_ttl_seconds: 120
"#,
        );

        let config = config_loader::run(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(config.settings.server.host, "0.0.0.0");
        assert_eq!(config.settings.server.port, "9090");
        assert_eq!(config.settings.metrics.path, "/internal/metrics");
        let logging = config.settings.logging.expect("logging section");
        assert_eq!(logging.format, LogFormat::Json);
        assert_eq!(config.wrike.token_url, "http://127.0.0.1:9999/oauth2/token");
        assert_eq!(config.wrike.scopes, vec!["Default", "wsReadOnly"]);
        assert_eq!(config.cache.user_ttl_seconds, 120);
        assert_eq!(config.cache.session_ttl_seconds, 86400);

        std::env::remove_var("WT_CFG_TOKEN_URL");
    }

    #[tokio::test]
    #[serial]
    async fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        let config = config_loader::run(path.to_str().unwrap()).await.unwrap();
        assert_eq!(config.wrike.default_host, "www.wrike.com");
        assert_eq!(config.settings.metrics.path, "/metrics");
    }

    #[tokio::test]
    #[serial]
    async fn metrics_path_may_not_shadow_api_routes() {
        let file = write_config(
            r#"
settings:
  metrics:
    is_enabled: true
    path: /api/metrics
"#,
        );

        let err = config_loader::run(file.path().to_str().unwrap())
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("settings.metrics.path"));
    }

    #[tokio::test]
    #[serial]
    async fn malformed_yaml_is_an_error() {
        let file = write_config("settings: [not, a, map");
        assert!(config_loader::run(file.path().to_str().unwrap()).await.is_err());
    }
}
