//! CSV rendering of contacts, tasks and spaces, and parsing of bulk
//! invitation uploads.

use csv::{ReaderBuilder, Trim, Writer};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::wrike::error::ApiError;
use crate::wrike::models::{default_invitation_role, Contact, Invitation, Space, Task};
use crate::wrike::roles::{category, localized_name, primary_role};

fn finish(writer: Writer<Vec<u8>>) -> Result<String, ApiError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::Decode(format!("csv export: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| ApiError::Decode(format!("csv export: {}", e)))
}

fn write_rows<const N: usize>(header: [&str; N], rows: impl Iterator<Item = [String; N]>) -> Result<String, ApiError> {
    let mut writer = Writer::from_writer(Vec::new());
    let to_err = |e: csv::Error| ApiError::Decode(format!("csv export: {}", e));
    writer.write_record(header).map_err(to_err)?;
    for row in rows {
        writer.write_record(&row).map_err(to_err)?;
    }
    finish(writer)
}

/// One row per contact. Role names follow `lang` (`ja` or English).
pub fn users_csv(contacts: &[Contact], lang: &str) -> Result<String, ApiError> {
    let rows = contacts.iter().map(|contact| {
        let role = primary_role(&contact.profiles);
        [
            contact.id.clone(),
            contact.first_name.clone(),
            contact.last_name.clone(),
            contact.email(),
            localized_name(&role, lang).to_string(),
            category(&role).to_string(),
            contact.contact_type.clone(),
            contact.deleted.to_string(),
        ]
    });
    write_rows(
        ["id", "firstName", "lastName", "email", "role", "roleCategory", "type", "deleted"],
        rows,
    )
}

pub fn tasks_csv(tasks: &[Task]) -> Result<String, ApiError> {
    let rows = tasks.iter().map(|task| {
        [
            task.id.clone(),
            task.title.clone(),
            task.status.clone(),
            task.importance.clone(),
            task.created_date.clone().unwrap_or_default(),
            task.updated_date.clone().unwrap_or_default(),
            task.dates.due.clone().unwrap_or_default(),
            task.responsible_ids.join(";"),
            task.permalink.clone().unwrap_or_default(),
        ]
    });
    write_rows(
        ["id", "title", "status", "importance", "createdDate", "updatedDate", "dueDate", "responsibleIds", "permalink"],
        rows,
    )
}

pub fn spaces_csv(spaces: &[Space]) -> Result<String, ApiError> {
    let rows = spaces.iter().map(|space| {
        [
            space.id.clone(),
            space.title.clone(),
            space.access_type.clone().unwrap_or_default(),
            space.archived.to_string(),
        ]
    });
    write_rows(["id", "title", "accessType", "archived"], rows)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvitationRow {
    #[serde(default)]
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    role: String,
}

/// Parse an upload with an `email,firstName,lastName,role` header. Rows
/// without an email are skipped; an upload with no usable row is rejected.
pub fn parse_invitations(content: &str) -> Result<Vec<Invitation>, ApiError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut invitations = Vec::new();
    for (line_num, result) in reader.deserialize::<InvitationRow>().enumerate() {
        let row = result.map_err(|e| ApiError::BadRequest(format!("line {}: {}", line_num + 2, e)))?;
        if row.email.is_empty() {
            warn!("skipping invitation row {} without email", line_num + 2);
            continue;
        }
        invitations.push(Invitation {
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            role: if row.role.is_empty() { default_invitation_role() } else { row.role },
        });
    }

    if invitations.is_empty() {
        return Err(ApiError::BadRequest("No valid invitations found in CSV".to_string()));
    }
    debug!("parsed {} invitations", invitations.len());
    Ok(invitations)
}
