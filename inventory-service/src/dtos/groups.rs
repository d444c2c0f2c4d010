use super::nullable;
use crate::models::{CascadeSummary, Group};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Full group body for create and replace.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GroupRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required."))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "Inventory is required."))]
    pub inventory_id: String,
    pub parent_group_id: Option<String>,
    #[serde(default)]
    pub variables: String,
}

impl GroupRequest {
    pub fn new(name: impl Into<String>, inventory_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            inventory_id: inventory_id.into(),
            parent_group_id: None,
            variables: String::new(),
        }
    }

    pub fn with_parent(mut self, parent_group_id: impl Into<String>) -> Self {
        self.parent_group_id = Some(parent_group_id.into());
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PatchGroupRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required."))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[validate(length(min = 1, message = "Inventory is required."))]
    pub inventory_id: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_group_id: Option<Option<String>>,
    pub variables: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub inventory_id: String,
    pub parent_group_id: Option<String>,
    pub variables: String,
    pub created_by_id: String,
    pub modified_by_id: String,
    pub created: String,
    pub modified: String,
}

impl From<Group> for GroupResponse {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            name: group.name,
            description: group.description,
            inventory_id: group.inventory_id,
            parent_group_id: group.parent_group_id,
            variables: group.variables,
            created_by_id: group.created_by_id,
            modified_by_id: group.modified_by_id,
            created: group.created.to_rfc3339(),
            modified: group.modified.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GroupListParams {
    pub inventory_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CascadeDeleteResponse {
    pub removed_groups: usize,
    pub removed_hosts: u64,
    pub removed_group_ids: Vec<String>,
}

impl From<CascadeSummary> for CascadeDeleteResponse {
    fn from(summary: CascadeSummary) -> Self {
        Self {
            removed_groups: summary.removed_group_ids.len(),
            removed_hosts: summary.removed_host_count,
            removed_group_ids: summary.removed_group_ids,
        }
    }
}
