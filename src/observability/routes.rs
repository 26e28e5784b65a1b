use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use http::{header::CONTENT_TYPE, StatusCode};
use prometheus::{Registry, TextEncoder};
use tracing::error;

use crate::config::settings::MetricsConfig;
use crate::server::server::AppState;

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Registry handle shared with the metrics route.
#[derive(Clone)]
pub struct MetricsState {
    pub registry: Arc<Registry>,
}

impl MetricsState {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Text exposition of everything registered so far.
    pub fn render(&self) -> prometheus::Result<String> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }

    /// Public router with the scrape endpoint, empty when metrics are off.
    pub fn router(&self, metrics_config: &MetricsConfig) -> Router<AppState> {
        if !metrics_config.is_enabled {
            return Router::new();
        }
        Router::new().route(metrics_config.path.as_str(), get(scrape))
    }
}

async fn scrape(State(state): State<AppState>) -> Response {
    match state.metrics_state.render() {
        Ok(body) => ([(CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!("failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::IntCounter;

    #[test]
    fn render_includes_registered_counters() {
        let registry = Registry::new();
        let counter = IntCounter::new("demo_total", "demo counter").unwrap();
        registry.register(Box::new(counter.clone())).unwrap();
        counter.inc_by(3);

        let text = MetricsState::new(registry).render().unwrap();
        assert!(text.contains("demo_total 3"));
    }
}
