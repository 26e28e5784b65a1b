use std::collections::HashMap;

use chrono::Duration;
use parking_lot::RwLock;
use tracing::info;

use crate::helpers::time::{expires_after, SharedClock};
use crate::tokens::token::{Token, TokenResponse};

/// `expires_in` as a chrono duration; values chrono cannot hold saturate.
fn lifetime(response: &TokenResponse) -> Duration {
    i64::try_from(response.expires_in)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

#[derive(Debug, Default)]
struct Slots {
    by_host: HashMap<String, Token>,
    current: Option<Token>,
}

/// Process-local token storage: one current token plus one token per host.
/// Cleared on restart.
#[derive(Debug)]
pub struct MemoryTokenStore {
    slots: RwLock<Slots>,
    clock: SharedClock,
}

impl MemoryTokenStore {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            slots: RwLock::new(Slots::default()),
            clock,
        }
    }

    fn resolve_host(response: &TokenResponse, host: Option<&str>) -> String {
        host.map(str::to_owned)
            .or_else(|| response.host.clone())
            .unwrap_or_default()
    }

    fn build(&self, response: &TokenResponse, host: String) -> Token {
        let now = self.clock.now();
        Token {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            expires_at: expires_after(now, lifetime(response)),
            host,
            created_at: now,
            updated_at: now,
        }
    }

    fn insert(slots: &mut Slots, token: Token) {
        if !token.host.is_empty() {
            slots.by_host.insert(token.host.clone(), token.clone());
        }
        slots.current = Some(token);
    }

    pub fn save(&self, response: &TokenResponse, host: Option<&str>) -> Token {
        let token = self.build(response, Self::resolve_host(response, host));
        Self::insert(&mut self.slots.write(), token.clone());
        info!("token saved to memory storage for host '{}'", token.host);
        token
    }

    /// Replace secrets and expiry of the host's token in one step, keeping
    /// its identity. Falls back to [`MemoryTokenStore::save`] for an unknown host.
    pub fn update(&self, response: &TokenResponse, host: Option<&str>) -> Token {
        let target = Self::resolve_host(response, host);
        let now = self.clock.now();
        let mut slots = self.slots.write();

        let Some(existing) = slots.by_host.get(&target).cloned() else {
            let token = self.build(response, target);
            Self::insert(&mut slots, token.clone());
            info!("token saved to memory storage for host '{}'", token.host);
            return token;
        };

        let updated = Token {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            expires_at: expires_after(now, lifetime(response)),
            updated_at: now,
            ..existing
        };
        slots.by_host.insert(target.clone(), updated.clone());
        if slots.current.as_ref().is_some_and(|t| t.host == target) {
            slots.current = Some(updated.clone());
        }
        info!("token updated for host '{}'", target);
        updated
    }

    pub fn current(&self) -> Option<Token> {
        self.slots.read().current.clone()
    }

    pub fn by_host(&self, host: &str) -> Option<Token> {
        self.slots.read().by_host.get(host).cloned()
    }

    pub fn remove(&self, host: Option<&str>) {
        let mut slots = self.slots.write();
        match host {
            Some(host) => {
                slots.by_host.remove(host);
                if slots.current.as_ref().is_some_and(|t| t.host == host) {
                    slots.current = None;
                }
            }
            None => {
                slots.by_host.clear();
                slots.current = None;
            }
        }
    }

    pub fn all(&self) -> Vec<Token> {
        let mut tokens: Vec<Token> = self.slots.read().by_host.values().cloned().collect();
        tokens.sort_by(|a, b| a.host.cmp(&b.host));
        tokens
    }

    pub fn hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = self.slots.read().by_host.keys().cloned().collect();
        hosts.sort();
        hosts
    }

    pub fn clear(&self) {
        self.remove(None);
        info!("token storage cleared");
    }
}
