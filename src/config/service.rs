use std::time::Duration;

use serde::Deserialize;

use crate::config::settings::SettingsConfig;

/// Root of `wrike-tools.yaml`. Every section is optional.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub wrike: WrikeConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Endpoints of the Wrike OAuth2 server and REST API.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WrikeConfig {
    pub auth_url: String,
    pub token_url: String,
    pub api_scheme: String,
    pub api_base_path: String,
    pub default_host: String,
    pub request_timeout_seconds: u64,
    pub scopes: Vec<String>,
}

pub const DEFAULT_SCOPES: &[&str] = &[
    "Default",
    "wsReadOnly",
    "wsReadWrite",
    "amReadOnlyUser",
    "amReadWriteUser",
    "amReadOnlyGroup",
    "amReadWriteGroup",
    "amReadOnlyWorkflow",
    "amReadWriteWorkflow",
    "dataExportFull",
    "amReadOnlyAuditLog",
    "amReadOnlyAccessRole",
    "amReadOnlyWorkSchedule",
    "amReadWriteWorkSchedule",
    "amReadOnlyInvitation",
    "amReadWriteInvitation",
];

impl Default for WrikeConfig {
    fn default() -> Self {
        Self {
            auth_url: "https://login.wrike.com/oauth2/authorize/v4".to_string(),
            token_url: "https://login.wrike.com/oauth2/token".to_string(),
            api_scheme: "https".to_string(),
            api_base_path: "/api/v4".to_string(),
            default_host: "www.wrike.com".to_string(),
            request_timeout_seconds: 30,
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl WrikeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn api_base_url(&self, host: &str) -> String {
        format!("{}://{}{}", self.api_scheme, host, self.api_base_path)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub default_ttl_seconds: u64,
    pub user_ttl_seconds: u64,
    /// How long the signed-in user id is remembered after the OAuth callback.
    pub session_ttl_seconds: u64,
    pub cleanup_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: 5 * 60,
            user_ttl_seconds: 10 * 60,
            session_ttl_seconds: 24 * 60 * 60,
            cleanup_interval_seconds: 60,
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    pub fn user_ttl(&self) -> Duration {
        Duration::from_secs(self.user_ttl_seconds)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds)
    }
}
