use std::fmt::Debug;
use std::sync::Arc;

use chrono::Duration;

use crate::config::env_settings::{EnvSettings, WRIKE_ACCESS_TOKEN, WRIKE_HOST, WRIKE_REFRESH_TOKEN};
use crate::helpers::time::{expires_after, SharedClock};
use crate::tokens::memory_store::MemoryTokenStore;
use crate::tokens::token::Token;

pub const DEFAULT_WRIKE_HOST: &str = "www.wrike.com";

/// Lifetime assumed for pre-provisioned tokens; their real expiry is unknown.
pub const ENV_TOKEN_LIFETIME_SECONDS: i64 = 3600;

/// Something that can answer "which token should outbound calls use now".
pub trait TokenProvider: Send + Sync + Debug {
    fn name(&self) -> &'static str;
    fn current_token(&self) -> Option<Token>;
}

impl TokenProvider for MemoryTokenStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn current_token(&self) -> Option<Token> {
        self.current()
    }
}

/// Token pre-provisioned through settings. Only yields a token when both
/// the access and refresh secrets are present.
#[derive(Debug)]
pub struct EnvTokenProvider {
    settings: Arc<EnvSettings>,
    clock: SharedClock,
}

impl EnvTokenProvider {
    pub fn new(settings: Arc<EnvSettings>, clock: SharedClock) -> Self {
        Self { settings, clock }
    }
}

impl TokenProvider for EnvTokenProvider {
    fn name(&self) -> &'static str {
        "env"
    }

    fn current_token(&self) -> Option<Token> {
        let access_token = self.settings.get(WRIKE_ACCESS_TOKEN)?;
        let refresh_token = self.settings.get(WRIKE_REFRESH_TOKEN)?;
        let now = self.clock.now();
        Some(Token {
            access_token,
            refresh_token,
            expires_at: expires_after(now, Duration::seconds(ENV_TOKEN_LIFETIME_SECONDS)),
            host: self.settings.get_or(WRIKE_HOST, DEFAULT_WRIKE_HOST),
            created_at: now,
            updated_at: now,
        })
    }
}
