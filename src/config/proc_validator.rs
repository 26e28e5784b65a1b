//! Configuration validation with aggregated errors.
//! Every problem found is collected into one `Vec<String>` so a bad file is
//! fixed in one pass instead of one error per restart.

use tracing::{error, info};
use url::Url;

use crate::config::service::{CacheConfig, ServiceConfig, WrikeConfig};
use crate::config::settings::{RetryConfig, SettingsConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_wrike(&cfg.wrike, &mut errors);
    validate_cache(&cfg.cache, &mut errors);

    if errors.is_empty() {
        info!("config is valid");
        Ok(())
    } else {
        for e in &errors {
            error!("config: {}", e);
        }
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(retry) = &settings.retry {
        validate_retry("settings.retry", retry, errors);
    }

    if settings.server.host.is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be an integer in range 0-65535",
            settings.server.port
        ));
    }

    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    } else if ["/auth", "/api", "/export"]
        .iter()
        .any(|prefix| metrics.path.starts_with(prefix))
    {
        errors.push(format!(
            "settings.metrics.path '{}' collides with application routes",
            metrics.path
        ));
    }

    if let Some(logging) = &settings.logging {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }
}

fn validate_retry(path: &str, retry: &RetryConfig, errors: &mut Vec<String>) {
    if let Some(attempts) = retry.attempts {
        if attempts == 0 {
            errors.push(format!("{}.attempts must be > 0", path));
        }
    }
    if let (Some(base), Some(max)) = (retry.base_delay_ms, retry.max_delay_ms) {
        if max < base {
            errors.push(format!(
                "{}.max_delay_ms ({}) must be >= base_delay_ms ({})",
                path, max, base
            ));
        }
    }
}

fn validate_wrike(wrike: &WrikeConfig, errors: &mut Vec<String>) {
    for (field, value) in [("auth_url", &wrike.auth_url), ("token_url", &wrike.token_url)] {
        match Url::parse(value) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(format!(
                "wrike.{} scheme '{}' must be http or https",
                field,
                url.scheme()
            )),
            Err(e) => errors.push(format!("wrike.{} '{}' is not a valid URL: {}", field, value, e)),
        }
    }

    if wrike.api_scheme != "http" && wrike.api_scheme != "https" {
        errors.push(format!(
            "wrike.api_scheme '{}' must be http or https",
            wrike.api_scheme
        ));
    }
    if !wrike.api_base_path.starts_with('/') {
        errors.push(format!(
            "wrike.api_base_path '{}' must start with '/'",
            wrike.api_base_path
        ));
    }
    if wrike.default_host.is_empty() {
        errors.push("wrike.default_host must not be empty".to_string());
    }
    if wrike.request_timeout_seconds == 0 {
        errors.push("wrike.request_timeout_seconds must be > 0".to_string());
    }
    if wrike.scopes.is_empty() {
        errors.push("wrike.scopes must list at least one scope".to_string());
    }
}

fn validate_cache(cache: &CacheConfig, errors: &mut Vec<String>) {
    for (field, value) in [
        ("default_ttl_seconds", cache.default_ttl_seconds),
        ("user_ttl_seconds", cache.user_ttl_seconds),
        ("session_ttl_seconds", cache.session_ttl_seconds),
        ("cleanup_interval_seconds", cache.cleanup_interval_seconds),
    ] {
        if value == 0 {
            errors.push(format!("cache.{} must be > 0", field));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::LoggingConfig;

    #[tokio::test]
    async fn defaults_are_valid() {
        assert!(validate_service_config(&ServiceConfig::default()).await.is_ok());
    }

    #[tokio::test]
    async fn all_problems_are_collected() {
        let mut cfg = ServiceConfig::default();
        cfg.settings.server.port = "http".into();
        cfg.settings.logging = Some(LoggingConfig::new("loud".into(), crate::config::settings::LogFormat::Json));
        cfg.settings.retry = Some(RetryConfig {
            attempts: Some(3),
            base_delay_ms: Some(500),
            max_delay_ms: Some(100),
        });
        cfg.wrike.token_url = "not a url".into();
        cfg.wrike.api_scheme = "ftp".into();
        cfg.cache.cleanup_interval_seconds = 0;

        let errors = validate_service_config(&cfg).await.unwrap_err();
        assert_eq!(errors.len(), 6, "{errors:?}");
    }

    #[tokio::test]
    async fn metrics_path_must_not_shadow_api() {
        let mut cfg = ServiceConfig::default();
        cfg.settings.metrics.path = "/api/metrics".into();
        let errors = validate_service_config(&cfg).await.unwrap_err();
        assert!(errors[0].contains("collides"));
    }
}
