use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Lazily initializes and returns the process-wide metrics registry.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Arc::new(Metrics::new())
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Wrike API
    pub api_requests: IntCounterVec,
    pub api_failures: IntCounterVec,
    pub api_request_duration: HistogramVec,

    // Tokens
    pub token_refreshes: IntCounterVec,

    // Cache
    pub cache_entries: IntGauge,
    pub cache_evictions: IntCounter,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Self {
        Self::build().expect("static metric definitions must register")
    }

    fn build() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("wriketools".into()), None)?;

        let metrics = Self {
            api_requests: IntCounterVec::new(
                Opts::new("api_requests_total", "Outbound Wrike API requests"),
                &["resource", "method"],
            )?,
            api_failures: IntCounterVec::new(
                Opts::new("api_failures_total", "Failed Wrike API requests by reason"),
                &["resource", "reason"],
            )?,
            api_request_duration: HistogramVec::new(
                HistogramOpts::new("api_request_duration_seconds", "Wrike API request duration seconds")
                    .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
                &["resource"],
            )?,
            token_refreshes: IntCounterVec::new(
                Opts::new("token_refreshes_total", "Token refresh attempts by outcome"),
                &["outcome"],
            )?,
            cache_entries: IntGauge::new("cache_entries", "Entries held by the TTL cache after the last sweep")?,
            cache_evictions: IntCounter::new("cache_evictions_total", "Expired entries removed by the sweep")?,
            config_validation_errors: IntCounter::new(
                "config_validation_errors_total",
                "Validation errors during startup",
            )?,
            up: IntGauge::new("up", "1 if service is healthy")?,
            registry,
        };

        let reg = &metrics.registry;
        reg.register(Box::new(metrics.api_requests.clone()))?;
        reg.register(Box::new(metrics.api_failures.clone()))?;
        reg.register(Box::new(metrics.api_request_duration.clone()))?;
        reg.register(Box::new(metrics.token_refreshes.clone()))?;
        reg.register(Box::new(metrics.cache_entries.clone()))?;
        reg.register(Box::new(metrics.cache_evictions.clone()))?;
        reg.register(Box::new(metrics.config_validation_errors.clone()))?;
        reg.register(Box::new(metrics.up.clone()))?;

        Ok(metrics)
    }
}
