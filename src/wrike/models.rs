use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::CachedUser;
use crate::wrike::error::ApiError;
use crate::wrike::roles::primary_role;

/// Envelope every Wrike v4 endpoint answers with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WrikeResponse<T = Value> {
    #[serde(default)]
    pub kind: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_size: Option<u64>,
}

impl WrikeResponse<Value> {
    /// Re-read the untyped payload as `T`.
    pub fn typed<T: serde::de::DeserializeOwned>(&self) -> Result<Vec<T>, ApiError> {
        self.data
            .iter()
            .map(|item| serde_json::from_value(item.clone()).map_err(ApiError::from))
            .collect()
    }
}

/// One account membership of a contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub account_id: String,
    pub role: String,
    pub external: bool,
    pub admin: bool,
    pub owner: bool,
    pub active: bool,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Contact {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "type")]
    pub contact_type: String,
    pub profiles: Vec<Profile>,
    pub deleted: bool,
    pub primary_email: Option<String>,
    pub title: Option<String>,
    pub company_name: Option<String>,
}

impl Contact {
    pub fn email(&self) -> String {
        self.primary_email
            .clone()
            .or_else(|| self.profiles.iter().find_map(|p| p.email.clone()))
            .unwrap_or_default()
    }

    pub fn to_cached(&self, raw: Value) -> CachedUser {
        CachedUser {
            id: self.id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email(),
            role: primary_role(&self.profiles).display_name.to_string(),
            data: raw,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Group {
    pub id: String,
    #[serde(alias = "name")]
    pub title: String,
    pub member_ids: Vec<String>,
    pub child_ids: Vec<String>,
    pub parent_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskDates {
    pub start: Option<String>,
    pub due: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: String,
    pub importance: String,
    pub created_date: Option<String>,
    pub updated_date: Option<String>,
    pub dates: TaskDates,
    pub responsible_ids: Vec<String>,
    pub permalink: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Space {
    pub id: String,
    pub title: String,
    pub access_type: Option<String>,
    pub archived: bool,
    pub description: Option<String>,
}

/// Body of `POST /invitations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default = "default_invitation_role")]
    pub role: String,
}

pub fn default_invitation_role() -> String {
    "User".to_string()
}

/// Outcome of one item of a bulk invitation run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvitationResult {
    pub email: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<WrikeResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_tolerates_missing_fields() {
        let parsed: WrikeResponse = serde_json::from_value(json!({"kind": "tasks"})).unwrap();
        assert!(parsed.data.is_empty());
        assert_eq!(parsed.next_page_token, None);

        let parsed: WrikeResponse = serde_json::from_value(json!({
            "kind": "tasks",
            "nextPageToken": "AB12",
            "data": [{"id": "T1", "title": "Write", "dates": {"due": "2024-05-01"}}]
        }))
        .unwrap();
        let tasks: Vec<Task> = parsed.typed().unwrap();
        assert_eq!(tasks[0].dates.due.as_deref(), Some("2024-05-01"));
        assert_eq!(parsed.next_page_token.as_deref(), Some("AB12"));
    }

    #[test]
    fn contact_email_prefers_primary_then_profiles() {
        let contact: Contact = serde_json::from_value(json!({
            "id": "U1",
            "firstName": "Aiko",
            "lastName": "Sato",
            "type": "Person",
            "profiles": [{"accountId": "A1", "role": "User", "email": "aiko@example.com"}]
        }))
        .unwrap();
        assert_eq!(contact.email(), "aiko@example.com");

        let cached = contact.to_cached(json!({"id": "U1"}));
        assert_eq!(cached.role, "Regular user");
        assert_eq!(cached.email, "aiko@example.com");
    }
}
