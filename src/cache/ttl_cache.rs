use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::helpers::time::{expires_after, to_chrono, SharedClock};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// One memoized value.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// An entry stays live up to and including its expiry instant.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub item_count: usize,
    pub keys: Vec<String>,
    /// Sum of key length and serialized value length; an estimate only.
    pub memory_usage: usize,
}

/// Key/value store with per-entry expiry.
///
/// Expired entries are invisible to readers immediately and physically
/// removed either on the next read of that key or by [`TtlCache::cleanup_expired`],
/// which the sweeper task calls on a fixed interval.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    default_ttl: Duration,
    clock: SharedClock,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration, clock: SharedClock) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
            clock,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store `value` until now + `ttl` (or the default TTL), replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let now = self.clock.now();
        let ttl = ttl.unwrap_or(self.default_ttl);
        let entry = CacheEntry {
            value,
            created_at: now,
            expires_at: expires_after(now, to_chrono(ttl)),
        };
        self.entries.lock().insert(key.into(), entry);
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                debug!("cache key '{}' expired on read", key);
                None
            }
            None => None,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => true,
            Some(_) => {
                entries.remove(key);
                false
            }
            None => false,
        }
    }

    pub fn delete(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    /// Remove every entry whose expiry has passed. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Keys of live entries, after a sweep.
    pub fn keys(&self) -> Vec<String> {
        self.cleanup_expired();
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of physically stored entries, live or not.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub(crate) fn entry(&self, key: &str) -> Option<CacheEntry<V>> {
        self.entries.lock().get(key).cloned()
    }
}

impl<V: Clone + Serialize> TtlCache<V> {
    pub fn status(&self) -> CacheStatus {
        self.cleanup_expired();
        let entries = self.entries.lock();
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        let memory_usage = entries
            .iter()
            .map(|(key, entry)| {
                key.len()
                    + serde_json::to_string(&entry.value)
                        .map(|s| s.len())
                        .unwrap_or(0)
            })
            .sum();

        CacheStatus {
            item_count: entries.len(),
            keys,
            memory_usage,
        }
    }
}
