//! Runtime settings backed by the process environment.
//!
//! Lookups go overlay → environment → built-in defaults. Writes only touch
//! the in-memory overlay; nothing is persisted and the process environment
//! is never mutated.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::warn;

pub const WRIKE_CLIENT_ID: &str = "WRIKE_CLIENT_ID";
pub const WRIKE_CLIENT_SECRET: &str = "WRIKE_CLIENT_SECRET";
pub const WRIKE_REDIRECT_URI: &str = "WRIKE_REDIRECT_URI";
pub const WRIKE_ACCESS_TOKEN: &str = "WRIKE_ACCESS_TOKEN";
pub const WRIKE_REFRESH_TOKEN: &str = "WRIKE_REFRESH_TOKEN";
pub const WRIKE_HOST: &str = "WRIKE_HOST";

const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    (WRIKE_REDIRECT_URI, "http://localhost:3000/auth/callback"),
    ("PORT", "3000"),
];

const REQUIRED_SETTINGS: &[&str] = &[WRIKE_CLIENT_ID, WRIKE_CLIENT_SECRET];
const SENSITIVE_KEYWORDS: &[&str] = &["token", "secret", "password", "key"];
const LISTED_PREFIXES: &[&str] = &["WRIKE_", "APP_"];

pub const MASKED_VALUE: &str = "[hidden]";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettingSource {
    Override,
    Env,
    Default,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SettingEntry {
    pub key: String,
    pub value: String,
    pub sensitive: bool,
    pub source: SettingSource,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RequiredSettingsReport {
    pub valid: bool,
    pub missing: Vec<String>,
}

pub fn is_sensitive(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

fn is_listed(key: &str) -> bool {
    LISTED_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

fn default_for(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

#[derive(Debug, Default)]
pub struct EnvSettings {
    env: HashMap<String, String>,
    overrides: RwLock<HashMap<String, String>>,
}

impl EnvSettings {
    /// Snapshot the current process environment.
    pub fn from_process_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            env: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            overrides: RwLock::new(HashMap::new()),
        }
    }

    fn lookup(&self, key: &str) -> Option<(String, SettingSource)> {
        if let Some(value) = self.overrides.read().get(key).filter(|v| !v.is_empty()) {
            return Some((value.clone(), SettingSource::Override));
        }
        if let Some(value) = self.env.get(key).filter(|v| !v.is_empty()) {
            return Some((value.clone(), SettingSource::Env));
        }
        default_for(key).map(|v| (v.to_string(), SettingSource::Default))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lookup(key).map(|(value, _)| value)
    }

    pub fn get_or(&self, key: &str, fallback: &str) -> String {
        self.get(key).unwrap_or_else(|| fallback.to_string())
    }

    pub fn get_many(&self, keys: &[&str]) -> BTreeMap<String, Option<String>> {
        keys.iter()
            .map(|key| (key.to_string(), self.get(key)))
            .collect()
    }

    pub fn set(&self, key: &str, value: &str) {
        if is_sensitive(key) {
            warn!("setting {} holds sensitive data and is kept in process memory only", key);
        }
        self.overrides
            .write()
            .insert(key.to_string(), value.to_string());
    }

    /// Drop an overlay value. Returns true if one existed.
    pub fn remove(&self, key: &str) -> bool {
        self.overrides.write().remove(key).is_some()
    }

    fn listed_keys(&self) -> Vec<String> {
        let overrides = self.overrides.read();
        let mut keys: Vec<String> = DEFAULT_SETTINGS
            .iter()
            .map(|(k, _)| k.to_string())
            .chain(self.env.keys().filter(|k| is_listed(k)).cloned())
            .chain(overrides.keys().filter(|k| is_listed(k)).cloned())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// All known settings; sensitive values masked unless `include_sensitive`.
    pub fn all(&self, include_sensitive: bool) -> BTreeMap<String, String> {
        self.listed_keys()
            .into_iter()
            .filter_map(|key| {
                let (value, _) = self.lookup(&key)?;
                let value = if is_sensitive(&key) && !include_sensitive {
                    MASKED_VALUE.to_string()
                } else {
                    value
                };
                Some((key, value))
            })
            .collect()
    }

    pub fn all_with_metadata(&self) -> Vec<SettingEntry> {
        self.listed_keys()
            .into_iter()
            .filter_map(|key| {
                let (value, source) = self.lookup(&key)?;
                let sensitive = is_sensitive(&key);
                Some(SettingEntry {
                    value: if sensitive { MASKED_VALUE.to_string() } else { value },
                    key,
                    sensitive,
                    source,
                })
            })
            .collect()
    }

    pub fn validate_required(&self) -> RequiredSettingsReport {
        let missing: Vec<String> = REQUIRED_SETTINGS
            .iter()
            .filter(|key| self.get(key).is_none())
            .map(|key| key.to_string())
            .collect();
        RequiredSettingsReport {
            valid: missing.is_empty(),
            missing,
        }
    }
}
