// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use httpmock::MockServer;
use reqwest::Client;
use serde_json::Value;

use crate::cache::TtlCache;
use crate::config::env_settings::{EnvSettings, WRIKE_CLIENT_ID, WRIKE_CLIENT_SECRET};
use crate::config::settings::RetryConfig;
use crate::config::ServiceConfig;
use crate::helpers::time::system_clock;
use crate::observability::metrics::get_metrics;
use crate::observability::routes::MetricsState;
use crate::server::server::{build_router, AppState};
use crate::tokens::{TokenManager, TokenResponse};
use crate::wrike::WrikeClient;

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// A Wrike client whose API and token endpoint both live on `server`.
pub struct WrikeHarness {
    pub server: MockServer,
    pub config: ServiceConfig,
    pub client: Arc<WrikeClient>,
    pub tokens: Arc<TokenManager>,
    pub cache: Arc<TtlCache<Value>>,
    pub settings: Arc<EnvSettings>,
}

impl WrikeHarness {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Like [`WrikeHarness::start`], with a hook to adjust the config
    /// before the client is built.
    pub async fn start_with(adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        let server = MockServer::start_async().await;

        let mut config = ServiceConfig::default();
        config.wrike.api_scheme = "http".to_string();
        config.wrike.token_url = server.url("/oauth2/token");
        config.settings.retry = Some(RetryConfig {
            attempts: Some(3),
            base_delay_ms: Some(1),
            max_delay_ms: Some(5),
        });
        adjust(&mut config);

        let clock = system_clock();
        let settings = Arc::new(EnvSettings::from_vars([
            (WRIKE_CLIENT_ID, "client-id"),
            (WRIKE_CLIENT_SECRET, "client-secret"),
        ]));
        let tokens = Arc::new(TokenManager::new(clock.clone()).with_env_override(settings.clone()));
        let cache = Arc::new(TtlCache::new(config.cache.default_ttl(), clock));
        let client = Arc::new(
            WrikeClient::new(&config, tokens.clone(), settings.clone(), cache.clone())
                .expect("wrike client"),
        );

        Self {
            server,
            config,
            client,
            tokens,
            cache,
            settings,
        }
    }

    /// `host:port` of the mock server, used as the token host.
    pub fn host(&self) -> String {
        self.server.address().to_string()
    }

    pub fn save_token(&self, access: &str, refresh: &str, expires_in: u64) {
        let host = self.host();
        self.tokens
            .save_token(&TokenResponse::new(access, refresh, expires_in), Some(&host));
    }

    pub async fn app_state(&self) -> AppState {
        let metrics_state = MetricsState::new(get_metrics().await.registry.clone());
        AppState::new(
            metrics_state,
            self.client.clone(),
            self.cache.clone(),
            self.settings.clone(),
        )
    }

    /// Serve the full router and return its base URL.
    pub async fn serve(&self) -> (JoinHandle<()>, String) {
        let router = build_router(self.app_state().await, &self.config.settings);
        let (handle, addr) = spawn_axum(router).await;
        (handle, format!("http://{}", addr))
    }
}

pub fn contact_json(id: &str, first: &str, role: &str) -> Value {
    json!({
        "id": id,
        "firstName": first,
        "lastName": "Tester",
        "type": "Person",
        "primaryEmail": format!("{}@example.com", first.to_lowercase()),
        "profiles": [{
            "accountId": "ACC1",
            "role": role,
            "external": false,
            "admin": false,
            "owner": false,
            "active": true
        }]
    })
}
