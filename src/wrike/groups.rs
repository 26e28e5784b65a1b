//! Flat `/groups` payload to a top-level tree with child summaries.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{json, Value};

use crate::wrike::error::ApiError;
use crate::wrike::models::Group;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MemberRef {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChildGroupSummary {
    pub id: String,
    pub title: String,
    pub member_ids: Vec<String>,
    pub member_count: usize,
    pub child_ids: Vec<String>,
    pub child_group_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetails {
    pub members: Vec<MemberRef>,
    pub child_groups: Vec<ChildGroupSummary>,
}

fn parse(raw: &[Value]) -> Result<Vec<Group>, ApiError> {
    raw.iter()
        .map(|item| serde_json::from_value(item.clone()).map_err(ApiError::from))
        .collect()
}

fn members(group: &Group) -> Vec<MemberRef> {
    group
        .member_ids
        .iter()
        .map(|id| MemberRef { id: id.clone() })
        .collect()
}

fn summary(group: &Group) -> ChildGroupSummary {
    ChildGroupSummary {
        id: group.id.clone(),
        title: group.title.clone(),
        member_ids: group.member_ids.clone(),
        member_count: group.member_ids.len(),
        child_ids: group.child_ids.clone(),
        child_group_count: group.child_ids.len(),
    }
}

/// Unknown child ids are skipped.
fn children(group: &Group, index: &HashMap<&str, &Group>) -> Vec<ChildGroupSummary> {
    group
        .child_ids
        .iter()
        .filter_map(|id| index.get(id.as_str()))
        .map(|child| summary(child))
        .collect()
}

/// Keep only groups without parents. Each keeps its original fields and
/// gains `members`, `memberCount`, `childGroups` and `childGroupCount`.
pub fn build_hierarchy(raw: &[Value]) -> Result<Vec<Value>, ApiError> {
    let groups = parse(raw)?;
    let index: HashMap<&str, &Group> = groups.iter().map(|g| (g.id.as_str(), g)).collect();

    groups
        .iter()
        .zip(raw)
        .filter(|(group, _)| group.parent_ids.is_empty())
        .map(|(group, original)| -> Result<Value, ApiError> {
            let mut node = original.clone();
            if let Value::Object(fields) = &mut node {
                fields.insert("members".into(), serde_json::to_value(members(group))?);
                fields.insert("memberCount".into(), json!(group.member_ids.len()));
                fields.insert("childGroups".into(), serde_json::to_value(children(group, &index))?);
                fields.insert("childGroupCount".into(), json!(group.child_ids.len()));
            }
            Ok(node)
        })
        .collect()
}

pub fn group_details(raw: &[Value], group_id: &str) -> Result<GroupDetails, ApiError> {
    let groups = parse(raw)?;
    let index: HashMap<&str, &Group> = groups.iter().map(|g| (g.id.as_str(), g)).collect();
    let group = index
        .get(group_id)
        .ok_or_else(|| ApiError::NotFound(format!("group {}", group_id)))?;

    Ok(GroupDetails {
        members: members(group),
        child_groups: children(group, &index),
    })
}
