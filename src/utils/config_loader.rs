use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::proc_loader::file_to_config;
use crate::config::ServiceConfig;

pub async fn run(config_path: &str) -> Result<ServiceConfig> {
    let path = Path::new(config_path);
    let config = file_to_config(path)
        .await
        .with_context(|| format!("invalid config '{}'", config_path))?;
    info!("config loaded from '{}'", config_path);
    Ok(config)
}
