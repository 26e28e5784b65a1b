use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::cache::ttl_cache::TtlCache;

pub const USER_KEY_PREFIX: &str = "user:";
pub const DEFAULT_USER_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CachedUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    /// Raw contact payload as returned by the API.
    #[serde(default)]
    pub data: Value,
}

/// Identity records stored in the shared cache under `user:<id>` with a
/// longer TTL than ordinary entries.
#[derive(Debug, Clone)]
pub struct UserCache {
    cache: Arc<TtlCache<Value>>,
    ttl: Duration,
}

impl UserCache {
    pub fn new(cache: Arc<TtlCache<Value>>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    fn key(user_id: &str) -> String {
        format!("{}{}", USER_KEY_PREFIX, user_id)
    }

    pub fn set_user(&self, user: &CachedUser) {
        match serde_json::to_value(user) {
            Ok(value) => self.cache.set(Self::key(&user.id), value, Some(self.ttl)),
            Err(e) => warn!("user {} not cached: {}", user.id, e),
        }
    }

    pub fn get_user(&self, user_id: &str) -> Option<CachedUser> {
        self.cache
            .get(&Self::key(user_id))
            .and_then(|value| serde_json::from_value(value).ok())
    }

    pub fn delete_user(&self, user_id: &str) {
        self.cache.delete(&Self::key(user_id));
    }

    pub fn all_users(&self) -> Vec<CachedUser> {
        self.cache
            .keys()
            .iter()
            .filter_map(|key| key.strip_prefix(USER_KEY_PREFIX))
            .filter_map(|id| self.get_user(id))
            .collect()
    }

    pub fn clear_users(&self) {
        self.cache
            .keys()
            .iter()
            .filter(|key| key.starts_with(USER_KEY_PREFIX))
            .for_each(|key| self.cache.delete(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ttl_cache::DEFAULT_TTL;
    use crate::helpers::time::ManualClock;
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;

    fn user(id: &str) -> CachedUser {
        CachedUser {
            id: id.to_string(),
            first_name: "Aiko".to_string(),
            last_name: "Tanaka".to_string(),
            email: format!("{}@example.com", id),
            role: "User".to_string(),
            data: json!({"id": id}),
        }
    }

    #[test]
    fn users_live_longer_than_default_entries() {
        let clock = ManualClock::new(Utc::now());
        let cache = Arc::new(TtlCache::new(DEFAULT_TTL, clock.clone()));
        let users = UserCache::new(cache.clone(), DEFAULT_USER_TTL);

        users.set_user(&user("U1"));
        cache.set("plain", json!(1), None);

        clock.advance(ChronoDuration::minutes(6));
        assert!(cache.get("plain").is_none());
        assert_eq!(users.get_user("U1"), Some(user("U1")));

        clock.advance(ChronoDuration::minutes(5));
        assert!(users.get_user("U1").is_none());
    }

    #[test]
    fn all_users_and_clear_users_only_touch_user_keys() {
        let clock = ManualClock::new(Utc::now());
        let cache = Arc::new(TtlCache::new(DEFAULT_TTL, clock));
        let users = UserCache::new(cache.clone(), DEFAULT_USER_TTL);

        users.set_user(&user("U1"));
        users.set_user(&user("U2"));
        cache.set("session:user_id", json!("U1"), None);

        let mut ids: Vec<String> = users.all_users().into_iter().map(|u| u.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["U1", "U2"]);

        users.delete_user("U2");
        assert_eq!(users.all_users().len(), 1);

        users.clear_users();
        assert!(users.all_users().is_empty());
        assert_eq!(cache.get("session:user_id"), Some(json!("U1")));
    }
}
