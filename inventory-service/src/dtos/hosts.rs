use super::nullable;
use crate::models::Host;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HostRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required."))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "Inventory is required."))]
    pub inventory_id: String,
    pub group_id: Option<String>,
    #[serde(default)]
    pub variables: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl HostRequest {
    pub fn new(name: impl Into<String>, inventory_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            inventory_id: inventory_id.into(),
            group_id: None,
            variables: String::new(),
            enabled: true,
        }
    }

    pub fn in_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PatchHostRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required."))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[validate(length(min = 1, message = "Inventory is required."))]
    pub inventory_id: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub group_id: Option<Option<String>>,
    pub variables: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HostResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub inventory_id: String,
    pub group_id: Option<String>,
    pub variables: String,
    pub enabled: bool,
    pub created_by_id: String,
    pub modified_by_id: String,
    pub created: String,
    pub modified: String,
}

impl From<Host> for HostResponse {
    fn from(host: Host) -> Self {
        Self {
            id: host.id,
            name: host.name,
            description: host.description,
            inventory_id: host.inventory_id,
            group_id: host.group_id,
            variables: host.variables,
            enabled: host.enabled,
            created_by_id: host.created_by_id,
            modified_by_id: host.modified_by_id,
            created: host.created.to_rfc3339(),
            modified: host.modified.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HostListParams {
    pub inventory_id: Option<String>,
    pub group_id: Option<String>,
}
