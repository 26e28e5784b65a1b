use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tokens this close to expiry are treated as invalid so they get refreshed
/// before a request can fail mid-flight.
pub const SAFETY_BUFFER_SECONDS: i64 = 5 * 60;

pub fn safety_buffer() -> Duration {
    Duration::seconds(SAFETY_BUFFER_SECONDS)
}

/// One OAuth2 credential set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub host: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Token {
    /// Valid means: expiry strictly later than `now` plus the safety buffer.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match now.checked_add_signed(safety_buffer()) {
            Some(threshold) => self.expires_at > threshold,
            None => false,
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Payload of the OAuth token endpoint, for both code exchange and refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub host: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl TokenResponse {
    pub fn new(access_token: &str, refresh_token: &str, expires_in: u64) -> Self {
        Self {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            token_type: default_token_type(),
            expires_in,
            host: None,
        }
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    pub has_current_token: bool,
    pub is_current_token_valid: bool,
    pub token_count: usize,
    pub hosts: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_expiring_at(expires_at: DateTime<Utc>) -> Token {
        let now = Utc::now();
        Token {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at,
            host: "www.wrike.com".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn buffer_boundary_counts_as_invalid() {
        let now = Utc::now();
        assert!(!token_expiring_at(now + safety_buffer()).is_valid_at(now));
        assert!(token_expiring_at(now + safety_buffer() + Duration::milliseconds(1)).is_valid_at(now));
        assert!(!token_expiring_at(now + Duration::minutes(4)).is_valid_at(now));
        assert!(!token_expiring_at(now - Duration::minutes(1)).is_valid_at(now));
    }

    #[test]
    fn token_response_parses_wrike_payload() {
        let body = r#"{"access_token":"x","refresh_token":"y","token_type":"bearer","expires_in":3600,"host":"app-eu.wrike.com"}"#;
        let parsed: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed, TokenResponse::new("x", "y", 3600).with_host("app-eu.wrike.com"));
    }

    #[test]
    fn secrets_are_never_serialized() {
        let json = serde_json::to_value(token_expiring_at(Utc::now())).unwrap();
        assert!(json.get("accessToken").is_none());
        assert!(json.get("refreshToken").is_none());
        assert_eq!(json["host"], "www.wrike.com");
    }
}
