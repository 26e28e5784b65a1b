use std::sync::Arc;

use anyhow::{Context, Result};
use axum::middleware::from_fn_with_state;
use axum::Router;
use serde_json::Value;
use tracing::info;

use crate::cache::TtlCache;
use crate::config::env_settings::EnvSettings;
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::get_metrics;
use crate::observability::routes::MetricsState;
use crate::server::{api_routes, auth_routes, export_routes, middleware, settings_routes};
use crate::tokens::TokenManager;
use crate::wrike::WrikeClient;

/// Everything a handler may touch. Built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub client: Arc<WrikeClient>,
    pub tokens: Arc<TokenManager>,
    pub cache: Arc<TtlCache<Value>>,
    pub settings: Arc<EnvSettings>,
}

impl AppState {
    pub fn new(
        metrics_state: MetricsState,
        client: Arc<WrikeClient>,
        cache: Arc<TtlCache<Value>>,
        settings: Arc<EnvSettings>,
    ) -> Self {
        Self {
            metrics_state,
            tokens: client.tokens().clone(),
            client,
            cache,
            settings,
        }
    }
}

/// `/auth` is public; `/api` and `/export` need a current token.
pub fn build_router(state: AppState, settings_config: &SettingsConfig) -> Router {
    let protected_api = api_routes::router()
        .merge(settings_routes::router())
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));
    let protected_export = export_routes::router()
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .nest("/auth", auth_routes::router())
        .nest("/api", protected_api)
        .nest("/export", protected_export)
        .merge(state.metrics_state.router(&settings_config.metrics))
        .with_state(state)
}

pub async fn start(settings_config: &SettingsConfig, state: AppState) -> Result<()> {
    let metrics = get_metrics().await;
    let app = build_router(state, settings_config);

    let bind_addr = settings_config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;
    info!("listening on {}", bind_addr);

    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;
    metrics.up.set(0);
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
