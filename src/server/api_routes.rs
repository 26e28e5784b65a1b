use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::cache::CachedUser;
use crate::export::csv_format::parse_invitations;
use crate::server::server::AppState;
use crate::wrike::groups::GroupDetails;
use crate::wrike::models::{Invitation, InvitationResult};
use crate::wrike::{ApiError, WrikeResponse};

type Params = Query<Vec<(String, String)>>;
type ApiResult<T = WrikeResponse> = Result<Json<T>, ApiError>;

/// Page size used to count tasks on the dashboard.
const DASHBOARD_TASK_PAGE: usize = 1000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/contacts", get(contacts))
        .route("/contacts/{id}", get(contact))
        .route("/spaces", get(spaces))
        .route("/folders", get(folders))
        .route("/spaces/{id}/folders", get(folders_in_space))
        .route("/tasks", get(tasks))
        .route("/folders/{id}/tasks", get(tasks_in_folder).post(create_task))
        .route("/invitations", post(create_invitation))
        .route("/invitations/bulk", post(create_bulk_invitations))
        .route("/groups", get(groups))
        .route("/groups/{id}/details", get(group_details))
        .route("/customfields", get(custom_fields))
        .route("/folder_blueprints", get(folder_blueprints))
        .route("/spaces/{id}/folder_blueprints", get(folder_blueprints_in_space))
        .route("/folder_blueprints/{id}/launch_async", post(launch_folder_blueprint))
        .route("/task_blueprints", get(task_blueprints))
        .route("/spaces/{id}/task_blueprints", get(task_blueprints_in_space))
        .route("/task_blueprints/{id}/launch_async", post(launch_task_blueprint))
        .route("/dashboard", get(dashboard))
        .route("/status", get(status))
}

/// Empty body means "no parameters".
fn json_or_empty(body: &Bytes) -> Result<Value, ApiError> {
    if body.is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {}", e)))
}

async fn me(State(state): State<AppState>) -> ApiResult<CachedUser> {
    Ok(Json(state.client.cached_current_user().await?))
}

async fn contacts(State(state): State<AppState>, Query(query): Params) -> ApiResult {
    Ok(Json(state.client.contacts(&query).await?))
}

async fn contact(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<CachedUser> {
    Ok(Json(state.client.cached_contact(&id).await?))
}

async fn spaces(State(state): State<AppState>, Query(query): Params) -> ApiResult {
    Ok(Json(state.client.spaces(&query).await?))
}

async fn folders(State(state): State<AppState>, Query(query): Params) -> ApiResult {
    Ok(Json(state.client.root_folders(&query).await?))
}

async fn folders_in_space(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Params,
) -> ApiResult {
    Ok(Json(state.client.folders_in_space(&id, &query).await?))
}

async fn tasks(State(state): State<AppState>, Query(query): Params) -> ApiResult {
    Ok(Json(state.client.tasks(&query).await?))
}

async fn tasks_in_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Params,
) -> ApiResult {
    Ok(Json(state.client.tasks_in_folder(&id, &query).await?))
}

async fn create_task(
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
    Json(task): Json<Value>,
) -> ApiResult {
    Ok(Json(state.client.create_task(&folder_id, &task).await?))
}

async fn create_invitation(
    State(state): State<AppState>,
    Json(invitation): Json<Invitation>,
) -> ApiResult {
    if invitation.email.trim().is_empty() {
        return Err(ApiError::BadRequest("email is required".to_string()));
    }
    Ok(Json(state.client.create_invitation(&invitation).await?))
}

/// Body is CSV text with an `email,firstName,lastName,role` header.
async fn create_bulk_invitations(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Vec<InvitationResult>> {
    let invitations = parse_invitations(&body)?;
    info!("bulk invitation upload with {} rows", invitations.len());
    Ok(Json(state.client.create_bulk_invitations(&invitations).await))
}

async fn groups(State(state): State<AppState>, Query(query): Params) -> ApiResult {
    Ok(Json(state.client.user_groups(&query).await?))
}

async fn group_details(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<GroupDetails> {
    Ok(Json(state.client.group_details(&id).await?))
}

async fn custom_fields(State(state): State<AppState>, Query(query): Params) -> ApiResult {
    Ok(Json(state.client.custom_fields(&query).await?))
}

async fn folder_blueprints(State(state): State<AppState>, Query(query): Params) -> ApiResult {
    Ok(Json(state.client.folder_blueprints(&query).await?))
}

async fn folder_blueprints_in_space(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Params,
) -> ApiResult {
    Ok(Json(state.client.folder_blueprints_in_space(&id, &query).await?))
}

async fn launch_folder_blueprint(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult {
    let params = json_or_empty(&body)?;
    Ok(Json(state.client.launch_folder_blueprint(&id, &params).await?))
}

async fn task_blueprints(State(state): State<AppState>, Query(query): Params) -> ApiResult {
    Ok(Json(state.client.task_blueprints(&query).await?))
}

async fn task_blueprints_in_space(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Params,
) -> ApiResult {
    Ok(Json(state.client.task_blueprints_in_space(&id, &query).await?))
}

async fn launch_task_blueprint(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult {
    let params = json_or_empty(&body)?;
    Ok(Json(state.client.launch_task_blueprint(&id, &params).await?))
}

#[derive(Debug, Serialize)]
struct DashboardStats {
    spaces: usize,
    /// A number, or `"1000+"` when more pages exist.
    tasks: Value,
    users: usize,
}

/// Counts for the landing page. A failing count is logged and shown as 0.
async fn dashboard(State(state): State<AppState>) -> Json<DashboardStats> {
    let task_query = [("pageSize".to_string(), DASHBOARD_TASK_PAGE.to_string())];
    let (spaces, tasks, users) = tokio::join!(
        state.client.spaces(&[]),
        state.client.tasks(&task_query),
        state.client.contacts(&[]),
    );

    let spaces = spaces
        .map(|r| r.data.len())
        .inspect_err(|e| error!("dashboard: spaces count failed: {}", e))
        .unwrap_or(0);
    let tasks = tasks
        .map(|r| match r.next_page_token {
            Some(_) => json!(format!("{}+", DASHBOARD_TASK_PAGE)),
            None => json!(r.data.len()),
        })
        .inspect_err(|e| error!("dashboard: tasks count failed: {}", e))
        .unwrap_or_else(|_| json!(0));
    let users = users
        .map(|r| r.data.len())
        .inspect_err(|e| error!("dashboard: users count failed: {}", e))
        .unwrap_or(0);

    Json(DashboardStats { spaces, tasks, users })
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "token": state.tokens.token_status(),
        "cache": state.cache.status(),
        "cachedUsers": state.client.users().all_users().len(),
    }))
}
