use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde_json::json;
use tracing::error;

/// Failures of the Wrike facade and the routes built on it.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not authenticated with Wrike")]
    NotAuthenticated,

    #[error("Setting {0} is not configured")]
    MissingSetting(&'static str),

    #[error("Permission denied by Wrike: {0}")]
    PermissionDenied(String),

    #[error("Wrike responded with {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Request to Wrike failed: {0}")]
    Transport(String),

    #[error("Unexpected response payload: {0}")]
    Decode(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// Network failures, rate limiting and 5xx answers; worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Remote { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Short label for the failure metric.
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::NotAuthenticated => "not_authenticated",
            ApiError::MissingSetting(_) => "missing_setting",
            ApiError::PermissionDenied(_) => "permission_denied",
            ApiError::Remote { .. } => "remote",
            ApiError::Transport(_) => "transport",
            ApiError::Decode(_) => "decode",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "not_authenticated"),
            ApiError::MissingSetting(_) => (StatusCode::INTERNAL_SERVER_ERROR, "missing_setting"),
            ApiError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "permission_denied"),
            ApiError::Remote { status, .. } if *status == 404 => (StatusCode::NOT_FOUND, "remote_not_found"),
            ApiError::Remote { .. } => (StatusCode::BAD_GATEWAY, "remote_error"),
            ApiError::Transport(_) => (StatusCode::BAD_GATEWAY, "transport_error"),
            ApiError::Decode(_) => (StatusCode::BAD_GATEWAY, "decode_error"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        if status.is_server_error() {
            error!("{}", self);
        }

        let body = json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}
