use std::sync::Arc;

use tracing::debug;

use crate::config::env_settings::EnvSettings;
use crate::helpers::time::SharedClock;
use crate::tokens::memory_store::MemoryTokenStore;
use crate::tokens::providers::{EnvTokenProvider, TokenProvider};
use crate::tokens::token::{Token, TokenResponse, TokenStatus};

/// Single source of truth for the credential used on outbound API calls.
///
/// Reads walk `providers` in order; the first one holding a token wins. The
/// memory store is always last. Writes only ever go to the memory store.
/// No operation here performs I/O or fails; absence is `None`.
#[derive(Debug)]
pub struct TokenManager {
    store: Arc<MemoryTokenStore>,
    providers: Vec<Arc<dyn TokenProvider>>,
    clock: SharedClock,
}

impl TokenManager {
    pub fn new(clock: SharedClock) -> Self {
        let store = Arc::new(MemoryTokenStore::new(clock.clone()));
        let memory: Arc<dyn TokenProvider> = store.clone();
        Self {
            providers: vec![memory],
            store,
            clock,
        }
    }

    /// Let pre-provisioned settings tokens take precedence over stored ones.
    pub fn with_env_override(mut self, settings: Arc<EnvSettings>) -> Self {
        let provider = EnvTokenProvider::new(settings, self.clock.clone());
        self.providers.insert(0, Arc::new(provider));
        self
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn save_token(&self, response: &TokenResponse, host: Option<&str>) -> Token {
        self.store.save(response, host)
    }

    pub fn get_current_token(&self) -> Option<Token> {
        self.providers.iter().find_map(|provider| {
            let token = provider.current_token();
            if token.is_some() {
                debug!("current token served by '{}' provider", provider.name());
            }
            token
        })
    }

    pub fn get_token_by_host(&self, host: &str) -> Option<Token> {
        self.store.by_host(host)
    }

    pub fn update_token(&self, response: &TokenResponse, host: Option<&str>) -> Token {
        self.store.update(response, host)
    }

    pub fn is_token_valid(&self, token: Option<&Token>) -> bool {
        token.is_some_and(|t| t.is_valid_at(self.clock.now()))
    }

    /// Drop one host's token, or every token when `host` is `None`.
    pub fn remove_token(&self, host: Option<&str>) {
        self.store.remove(host)
    }

    pub fn all_tokens(&self) -> Vec<Token> {
        self.store.all()
    }

    pub fn token_status(&self) -> TokenStatus {
        let current = self.get_current_token();
        let hosts = self.store.hosts();
        TokenStatus {
            has_current_token: current.is_some(),
            is_current_token_valid: self.is_token_valid(current.as_ref()),
            token_count: hosts.len(),
            hosts,
        }
    }

    pub fn clear(&self) {
        self.store.clear()
    }
}
