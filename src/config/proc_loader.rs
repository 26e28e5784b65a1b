use std::{fs, io::ErrorKind, path::Path};

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tracing::{debug, error, warn};

use crate::config::proc_validator;
use crate::config::service::ServiceConfig;
use crate::observability::metrics::get_metrics;

/// Load and validate config from a YAML file. A missing file is not an
/// error: every section has defaults.
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("config file '{}' not found, using defaults", path.display());
            String::new()
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading config file '{}'", path.display()))
        }
    };

    let expanded = expand_env_vars(&content)?;
    parse_config(&expanded).await
}

pub async fn parse_config(content: &str) -> Result<ServiceConfig> {
    let service_config: ServiceConfig = if content.trim().is_empty() {
        ServiceConfig::default()
    } else {
        serde_yaml::from_str(content).inspect_err(|e| error!("parse config error: {}", e))?
    };

    debug!("validation config ...");
    if let Err(errors) = proc_validator::validate_service_config(&service_config).await {
        let metrics = get_metrics().await;
        metrics.config_validation_errors.inc_by(errors.len() as u64);
        return Err(anyhow!("config validation failed: {}", errors.join("; ")));
    }

    Ok(service_config)
}

/// Replace `${VAR}` and `${VAR:default}` with process environment values.
pub fn expand_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}")?;
    let expanded = re.replace_all(input, |caps: &regex::Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    });
    Ok(expanded.into_owned())
}
