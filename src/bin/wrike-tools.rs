use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};

use wrike_tools::cache::sweeper::spawn_cleanup_task;
use wrike_tools::cache::TtlCache;
use wrike_tools::config::env_settings::EnvSettings;
use wrike_tools::helpers::time::system_clock;
use wrike_tools::observability::metrics::get_metrics;
use wrike_tools::observability::routes::MetricsState;
use wrike_tools::server::server::{self, AppState};
use wrike_tools::tokens::TokenManager;
use wrike_tools::utils::logging::LogLevel;
use wrike_tools::utils::{config_loader, logging};
use wrike_tools::wrike::WrikeClient;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "wrike-tools.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Environment, config, logging
    // -------------------------------

    dotenvy::dotenv().ok();
    let args = Args::parse();

    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level)?;

    // -------------------------------
    // 2. Settings and token sources
    // -------------------------------

    let clock = system_clock();
    let settings = Arc::new(EnvSettings::from_process_env());
    let report = settings.validate_required();
    if !report.valid {
        warn!(
            "missing required settings: {}; OAuth login will fail until they are set",
            report.missing.join(", ")
        );
    }

    let tokens = Arc::new(TokenManager::new(clock.clone()).with_env_override(settings.clone()));
    info!("token sources: {}", tokens.provider_names().join(" -> "));

    // -------------------------------
    // 3. Cache and Wrike client
    // -------------------------------

    let cache: Arc<TtlCache<Value>> = Arc::new(TtlCache::new(service_config.cache.default_ttl(), clock));
    let sweeper = spawn_cleanup_task(cache.clone(), service_config.cache.cleanup_interval());

    let client = Arc::new(WrikeClient::new(
        &service_config,
        tokens,
        settings.clone(),
        cache.clone(),
    )?);

    // -------------------------------
    // 4. HTTP server
    // -------------------------------

    let metrics_state = MetricsState::new(get_metrics().await.registry.clone());
    let state = AppState::new(metrics_state, client, cache, settings);

    info!("Service starting...");
    let result = server::start(&service_config.settings, state).await;
    sweeper.abort();
    result
}
