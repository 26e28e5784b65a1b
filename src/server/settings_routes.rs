use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::env_settings::{is_sensitive, MASKED_VALUE};
use crate::server::server::AppState;
use crate::wrike::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(list).post(update))
        .route("/settings/metadata", get(metadata))
        .route("/settings/{key}", get(read).delete(remove))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    #[serde(default)]
    include_sensitive: bool,
}

async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> Json<Value> {
    Json(json!({
        "settings": state.settings.all(params.include_sensitive),
        "required": state.settings.validate_required(),
    }))
}

async fn metadata(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "settings": state.settings.all_with_metadata() }))
}

#[derive(Debug, Deserialize)]
struct ReadParams {
    #[serde(default)]
    reveal: bool,
}

async fn read(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<ReadParams>,
) -> Result<Json<Value>, ApiError> {
    let value = state
        .settings
        .get(&key)
        .ok_or_else(|| ApiError::NotFound(format!("setting {}", key)))?;
    let value = if is_sensitive(&key) && !params.reveal {
        MASKED_VALUE.to_string()
    } else {
        value
    };
    Ok(Json(json!({ "key": key, "value": value })))
}

#[derive(Debug, Deserialize)]
struct UpdateBody {
    key: String,
    value: String,
}

async fn update(
    State(state): State<AppState>,
    Json(body): Json<UpdateBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let key = body.key.trim();
    if key.is_empty() {
        return Err(ApiError::BadRequest("key is required".to_string()));
    }
    state.settings.set(key, &body.value);
    info!("setting {} updated", key);
    Ok((StatusCode::OK, Json(json!({ "key": key, "updated": true }))))
}

async fn remove(State(state): State<AppState>, Path(key): Path<String>) -> Json<Value> {
    let removed = state.settings.remove(&key);
    if removed {
        info!("setting {} override removed", key);
    }
    Json(json!({ "key": key, "removed": removed }))
}
