use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::Deserialize;
use tracing::info;

use crate::export::csv_format::{spaces_csv, tasks_csv, users_csv};
use crate::server::server::AppState;
use crate::wrike::models::{Contact, Space, Task};
use crate::wrike::ApiError;

const EXPORT_TASK_PAGE: &str = "1000";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users.csv", get(users))
        .route("/tasks.csv", get(tasks))
        .route("/spaces.csv", get(spaces))
}

fn csv_attachment(filename: &str, body: String) -> Response {
    (
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        body,
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct LangParams {
    #[serde(default = "default_lang")]
    lang: String,
}

fn default_lang() -> String {
    "en".to_string()
}

async fn users(State(state): State<AppState>, Query(params): Query<LangParams>) -> Result<Response, ApiError> {
    let contacts: Vec<Contact> = state.client.contacts(&[]).await?.typed()?;
    info!("exporting {} contacts", contacts.len());
    Ok(csv_attachment("users.csv", users_csv(&contacts, &params.lang)?))
}

async fn tasks(State(state): State<AppState>) -> Result<Response, ApiError> {
    let query = [("pageSize".to_string(), EXPORT_TASK_PAGE.to_string())];
    let tasks: Vec<Task> = state.client.tasks(&query).await?.typed()?;
    info!("exporting {} tasks", tasks.len());
    Ok(csv_attachment("tasks.csv", tasks_csv(&tasks)?))
}

async fn spaces(State(state): State<AppState>) -> Result<Response, ApiError> {
    let spaces: Vec<Space> = state.client.spaces(&[]).await?.typed()?;
    Ok(csv_attachment("spaces.csv", spaces_csv(&spaces)?))
}
