use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::server::server::AppState;
use crate::wrike::ApiError;

/// Reject with 401 JSON unless some token source holds a current token.
pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.tokens.get_current_token().is_none() {
        debug!("unauthenticated request to {}", request.uri().path());
        return ApiError::NotAuthenticated.into_response();
    }
    next.run(request).await
}
