use tracing::{error, info};
use url::Url;

use crate::config::env_settings::{WRIKE_CLIENT_ID, WRIKE_CLIENT_SECRET, WRIKE_REDIRECT_URI};
use crate::observability::metrics::get_metrics;
use crate::tokens::{Token, TokenResponse};
use crate::wrike::client::WrikeClient;
use crate::wrike::error::ApiError;

impl WrikeClient {
    fn required(&self, key: &'static str) -> Result<String, ApiError> {
        self.settings.get(key).ok_or(ApiError::MissingSetting(key))
    }

    /// Where to send the browser to start the authorization-code flow.
    pub fn authorization_url(&self) -> Result<String, ApiError> {
        let client_id = self.required(WRIKE_CLIENT_ID)?;
        let redirect_uri = self.required(WRIKE_REDIRECT_URI)?;
        let scope = self.config.scopes.join(",");

        let url = Url::parse_with_params(
            &self.config.auth_url,
            [
                ("client_id", client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", redirect_uri.as_str()),
                ("scope", scope.as_str()),
            ],
        )
        .map_err(|e| ApiError::BadRequest(format!("invalid auth_url '{}': {}", self.config.auth_url, e)))?;
        Ok(url.into())
    }

    /// Trade an authorization code for a token and make it current.
    /// Codes are single use, so this is never retried.
    pub async fn exchange_code(&self, code: &str) -> Result<Token, ApiError> {
        let client_id = self.required(WRIKE_CLIENT_ID)?;
        let client_secret = self.required(WRIKE_CLIENT_SECRET)?;
        let redirect_uri = self.required(WRIKE_REDIRECT_URI)?;

        let response = self
            .post_token_endpoint(&[
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .await?;

        let token = self.tokens.save_token(&response, response.host.as_deref());
        info!("authorization code exchanged, token stored for host '{}'", token.host);
        Ok(token)
    }

    /// Exchange the current refresh secret for a new token pair.
    pub async fn refresh_token(&self) -> Result<Token, ApiError> {
        let _gate = self.refresh_gate.lock().await;
        let current = self.tokens.get_current_token().ok_or(ApiError::NotAuthenticated)?;
        self.refresh_locked(&current).await
    }

    /// Caller holds `refresh_gate`.
    pub(crate) async fn refresh_locked(&self, current: &Token) -> Result<Token, ApiError> {
        let metrics = get_metrics().await;
        let client_id = self.required(WRIKE_CLIENT_ID)?;
        let client_secret = self.required(WRIKE_CLIENT_SECRET)?;

        let params = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", current.refresh_token.as_str()),
        ];
        let outcome = self
            .retry
            .run_with_retry(|| self.post_token_endpoint(&params), ApiError::is_transient)
            .await;

        match outcome {
            Ok(response) => {
                let host = response.host.clone().unwrap_or_else(|| current.host.clone());
                let token = self.tokens.update_token(&response, Some(&host));
                metrics.token_refreshes.with_label_values(&["success"]).inc();
                info!("token refreshed for host '{}', expires at {}", token.host, token.expires_at);
                Ok(token)
            }
            Err(e) => {
                metrics.token_refreshes.with_label_values(&["failure"]).inc();
                error!("token refresh failed: {}", e);
                Err(e)
            }
        }
    }

    async fn post_token_endpoint(&self, params: &[(&str, &str)]) -> Result<TokenResponse, ApiError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
