use http::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::cache::CachedUser;
use crate::wrike::client::{Query, WrikeClient};
use crate::wrike::error::ApiError;
use crate::wrike::groups::{build_hierarchy, group_details, GroupDetails};
use crate::wrike::models::{Contact, Invitation, InvitationResult, WrikeResponse};

pub const DEFAULT_TASK_PAGE_SIZE: u32 = 100;

/// Cache key holding the id of the user who completed the OAuth flow.
pub const SESSION_USER_KEY: &str = "session:user_id";

/// `query` plus `key=value` unless the caller already set `key`.
fn with_default(query: &Query, key: &str, value: &str) -> Vec<(String, String)> {
    let mut params = query.to_vec();
    if !params.iter().any(|(k, _)| k == key) {
        params.push((key.to_string(), value.to_string()));
    }
    params
}

impl WrikeClient {
    async fn get(&self, path: &str, query: &Query) -> Result<WrikeResponse, ApiError> {
        self.request(Method::GET, path, query, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<WrikeResponse, ApiError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn current_user(&self) -> Result<WrikeResponse, ApiError> {
        self.get("/contacts", &[("me".to_string(), "true".to_string())]).await
    }

    pub async fn contacts(&self, query: &Query) -> Result<WrikeResponse, ApiError> {
        self.get("/contacts", query).await
    }

    pub async fn contact(&self, contact_id: &str) -> Result<WrikeResponse, ApiError> {
        self.get(&format!("/contacts/{}", contact_id), &[]).await
    }

    pub async fn spaces(&self, query: &Query) -> Result<WrikeResponse, ApiError> {
        self.get("/spaces", query).await
    }

    /// Top-level folders only unless the caller asks for `descendants`.
    pub async fn root_folders(&self, query: &Query) -> Result<WrikeResponse, ApiError> {
        self.get("/folders", &with_default(query, "descendants", "false"))
            .await
    }

    pub async fn folders(&self, query: &Query) -> Result<WrikeResponse, ApiError> {
        self.get("/folders", query).await
    }

    pub async fn folders_in_space(&self, space_id: &str, query: &Query) -> Result<WrikeResponse, ApiError> {
        self.get(&format!("/spaces/{}/folders", space_id), query).await
    }

    pub async fn tasks(&self, query: &Query) -> Result<WrikeResponse, ApiError> {
        let params = with_default(query, "pageSize", &DEFAULT_TASK_PAGE_SIZE.to_string());
        self.get("/tasks", &params).await
    }

    pub async fn tasks_in_folder(&self, folder_id: &str, query: &Query) -> Result<WrikeResponse, ApiError> {
        let params = with_default(query, "pageSize", &DEFAULT_TASK_PAGE_SIZE.to_string());
        self.get(&format!("/folders/{}/tasks", folder_id), &params).await
    }

    pub async fn create_task(&self, folder_id: &str, task: &Value) -> Result<WrikeResponse, ApiError> {
        self.post(&format!("/folders/{}/tasks", folder_id), task).await
    }

    pub async fn create_invitation(&self, invitation: &Invitation) -> Result<WrikeResponse, ApiError> {
        self.post("/invitations", &serde_json::to_value(invitation)?).await
    }

    /// Sends invitations one by one; a failure is recorded for its item and
    /// does not stop the rest.
    pub async fn create_bulk_invitations(&self, invitations: &[Invitation]) -> Vec<InvitationResult> {
        let mut results = Vec::with_capacity(invitations.len());
        for invitation in invitations {
            let result = match self.create_invitation(invitation).await {
                Ok(data) => InvitationResult {
                    email: invitation.email.clone(),
                    success: true,
                    data: Some(data),
                    error: None,
                },
                Err(e) => {
                    warn!("invitation for {} failed: {}", invitation.email, e);
                    InvitationResult {
                        email: invitation.email.clone(),
                        success: false,
                        data: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(result);
        }
        info!(
            "bulk invitations: {} of {} succeeded",
            results.iter().filter(|r| r.success).count(),
            results.len()
        );
        results
    }

    /// Groups as a tree of top-level entries; see [`build_hierarchy`].
    pub async fn user_groups(&self, query: &Query) -> Result<WrikeResponse, ApiError> {
        let mut response = self.get("/groups", query).await?;
        let total = response.data.len();
        response.data = build_hierarchy(&response.data)?;
        debug!("{} groups, {} top-level", total, response.data.len());
        Ok(response)
    }

    pub async fn group_details(&self, group_id: &str) -> Result<GroupDetails, ApiError> {
        let response = self.get("/groups", &[]).await?;
        group_details(&response.data, group_id)
    }

    pub async fn custom_fields(&self, query: &Query) -> Result<WrikeResponse, ApiError> {
        self.get("/customfields", query).await
    }

    pub async fn folder_blueprints(&self, query: &Query) -> Result<WrikeResponse, ApiError> {
        self.get("/folder_blueprints", query).await
    }

    pub async fn folder_blueprints_in_space(&self, space_id: &str, query: &Query) -> Result<WrikeResponse, ApiError> {
        self.get(&format!("/spaces/{}/folder_blueprints", space_id), query).await
    }

    pub async fn launch_folder_blueprint(&self, blueprint_id: &str, params: &Value) -> Result<WrikeResponse, ApiError> {
        self.post(&format!("/folder_blueprints/{}/launch_async", blueprint_id), params).await
    }

    pub async fn task_blueprints(&self, query: &Query) -> Result<WrikeResponse, ApiError> {
        self.get("/task_blueprints", query).await
    }

    pub async fn task_blueprints_in_space(&self, space_id: &str, query: &Query) -> Result<WrikeResponse, ApiError> {
        self.get(&format!("/spaces/{}/task_blueprints", space_id), query).await
    }

    pub async fn launch_task_blueprint(&self, blueprint_id: &str, params: &Value) -> Result<WrikeResponse, ApiError> {
        self.post(&format!("/task_blueprints/{}/launch_async", blueprint_id), params).await
    }

    fn first_contact(response: &WrikeResponse, what: &str) -> Result<CachedUser, ApiError> {
        let raw = response
            .data
            .first()
            .cloned()
            .ok_or_else(|| ApiError::NotFound(what.to_string()))?;
        let contact: Contact = serde_json::from_value(raw.clone())?;
        Ok(contact.to_cached(raw))
    }

    /// Contact from the user cache, fetched and cached on a miss.
    pub async fn cached_contact(&self, contact_id: &str) -> Result<CachedUser, ApiError> {
        if let Some(user) = self.users.get_user(contact_id) {
            debug!("user {} served from cache", contact_id);
            return Ok(user);
        }
        let response = self.contact(contact_id).await?;
        let user = Self::first_contact(&response, &format!("contact {}", contact_id))?;
        self.users.set_user(&user);
        Ok(user)
    }

    /// The signed-in user. Remembers their id for the session TTL so later
    /// calls are answered from the user cache.
    pub async fn cached_current_user(&self) -> Result<CachedUser, ApiError> {
        if let Some(user) = self.session_user_id().and_then(|id| self.users.get_user(&id)) {
            return Ok(user);
        }

        let response = self.current_user().await?;
        let user = Self::first_contact(&response, "current user")?;
        self.users.set_user(&user);
        self.cache
            .set(SESSION_USER_KEY, json!(user.id), Some(self.session_ttl));
        Ok(user)
    }

    /// Session user id, if one is remembered.
    pub fn session_user_id(&self) -> Option<String> {
        self.cache
            .get(SESSION_USER_KEY)
            .and_then(|id| id.as_str().map(str::to_owned))
    }

    pub fn forget_session(&self) {
        if let Some(id) = self.session_user_id() {
            self.users.delete_user(&id);
        }
        self.cache.delete(SESSION_USER_KEY);
    }
}
