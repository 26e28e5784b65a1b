use std::sync::Arc;
use std::time::{Duration, Instant};

use http::header::AUTHORIZATION;
use http::Method;
use reqwest::{Client, Response};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{TtlCache, UserCache};
use crate::config::env_settings::EnvSettings;
use crate::config::service::{ServiceConfig, WrikeConfig};
use crate::observability::metrics::get_metrics;
use crate::resilience::retry::RetrySettings;
use crate::tokens::{Token, TokenManager};
use crate::wrike::error::ApiError;
use crate::wrike::models::WrikeResponse;

/// Query string as handed over by routes: repeated keys allowed, order kept.
pub type Query = [(String, String)];

/// Wrike REST client. Reads the credential from [`TokenManager`] on every
/// call, refreshes it when it is about to expire, and on a 401 refreshes
/// once and retries the request exactly once.
#[derive(Debug)]
pub struct WrikeClient {
    pub(crate) http: Client,
    pub(crate) tokens: Arc<TokenManager>,
    pub(crate) settings: Arc<EnvSettings>,
    pub(crate) config: WrikeConfig,
    pub(crate) retry: RetrySettings,
    pub(crate) cache: Arc<TtlCache<Value>>,
    pub(crate) users: UserCache,
    pub(crate) session_ttl: Duration,
    // one refresh in flight at a time; refresh secrets rotate on use
    pub(crate) refresh_gate: Mutex<()>,
}

impl WrikeClient {
    pub fn new(
        service_config: &ServiceConfig,
        tokens: Arc<TokenManager>,
        settings: Arc<EnvSettings>,
        cache: Arc<TtlCache<Value>>,
    ) -> Result<Self, ApiError> {
        let config = service_config.wrike.clone();
        let http = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            http,
            tokens,
            settings,
            retry: RetrySettings::from(service_config.settings.retry.as_ref()),
            users: UserCache::new(cache.clone(), service_config.cache.user_ttl()),
            session_ttl: service_config.cache.session_ttl(),
            cache,
            config,
            refresh_gate: Mutex::new(()),
        })
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    pub fn users(&self) -> &UserCache {
        &self.users
    }

    /// Authenticated call to `{api_scheme}://{host}{api_base_path}{path}`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<WrikeResponse, ApiError> {
        let mut token = self.tokens.get_current_token().ok_or(ApiError::NotAuthenticated)?;

        if !self.tokens.is_token_valid(Some(&token)) {
            info!("token for '{}' expires at {}, refreshing before request", token.host, token.expires_at);
            token = self.refresh_after(&token).await?;
        }

        match self.send(&token, &method, path, query, body).await {
            Err(ApiError::Remote { status: 401, .. }) => {
                warn!("{} {} rejected with 401, refreshing token and retrying once", method, path);
                let refreshed = self.refresh_after(&token).await?;
                self.send(&refreshed, &method, path, query, body).await
            }
            other => other,
        }
    }

    async fn send(
        &self,
        token: &Token,
        method: &Method,
        path: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<WrikeResponse, ApiError> {
        let metrics = get_metrics().await;
        let resource = resource_label(path);
        let url = format!("{}{}", self.config.api_base_url(&token.host), path);
        debug!("{} {}", method, url);

        metrics
            .api_requests
            .with_label_values(&[resource, method.as_str()])
            .inc();
        let started = Instant::now();

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(AUTHORIZATION, token.bearer())
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let result = match request.send().await {
            Ok(response) => Self::read_response(response).await,
            Err(e) => Err(ApiError::from(e)),
        };

        metrics
            .api_request_duration
            .with_label_values(&[resource])
            .observe(started.elapsed().as_secs_f64());
        if let Err(e) = &result {
            metrics
                .api_failures
                .with_label_values(&[resource, e.reason()])
                .inc();
        }
        result
    }

    async fn read_response(response: Response) -> Result<WrikeResponse, ApiError> {
        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            403 => Err(ApiError::PermissionDenied(body)),
            code => Err(ApiError::Remote { status: code, body }),
        }
    }

    /// Refresh unless another task already replaced `seen` while we waited.
    pub(crate) async fn refresh_after(&self, seen: &Token) -> Result<Token, ApiError> {
        let _gate = self.refresh_gate.lock().await;
        if let Some(current) = self.tokens.get_current_token() {
            if current.access_token != seen.access_token && self.tokens.is_token_valid(Some(&current)) {
                debug!("token already refreshed by a concurrent request");
                return Ok(current);
            }
        }
        self.refresh_locked(seen).await
    }
}

/// First path segment, used as a low-cardinality metric label.
fn resource_label(path: &str) -> &str {
    path.trim_start_matches('/')
        .split(['/', '?'])
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("root")
}
