use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::server::server::AppState;
use crate::wrike::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/logout", get(logout))
        .route("/status", get(status))
}

async fn login(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let url = state.client.authorization_url()?;
    Ok(Redirect::to(&url))
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, ApiError> {
    if let Some(error) = params.error {
        warn!("authorization denied: {}", error);
        return Err(ApiError::BadRequest(format!("Authentication failed: {}", error)));
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No authorization code received".to_string()))?;

    state.client.exchange_code(&code).await?;
    let user = state.client.cached_current_user().await?;
    info!("user {} signed in", user.id);

    Ok(Json(json!({ "authenticated": true, "user": user })).into_response())
}

async fn logout(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.client.forget_session();
    state.tokens.remove_token(None);
    let still_authenticated = state.tokens.get_current_token().is_some();
    if still_authenticated {
        warn!("logged out, but a pre-provisioned token from settings is still active");
    }
    Json(json!({ "authenticated": still_authenticated }))
}

async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let user = state
        .client
        .session_user_id()
        .and_then(|id| state.client.users().get_user(&id));
    Json(json!({
        "authenticated": state.tokens.get_current_token().is_some(),
        "user": user,
        "token": state.tokens.token_status(),
    }))
}
