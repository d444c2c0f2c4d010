use crate::models::{Inventory, InventoryKind};
use crate::services::InventoryRemoval;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInventoryRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required."))]
    pub name: String,
    pub description: Option<String>,
    pub project_id: Option<String>,
    #[serde(default)]
    pub kind: InventoryKind,
    #[serde(default)]
    pub lines: Vec<String>,
    pub key_id: Option<String>,
    pub ssh_key_id: Option<String>,
}

impl CreateInventoryRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            project_id: None,
            kind: InventoryKind::Static,
            lines: Vec::new(),
            key_id: None,
            ssh_key_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InventoryResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub project_id: Option<String>,
    pub kind: InventoryKind,
    pub lines: Vec<String>,
    pub key_id: Option<String>,
    pub ssh_key_id: Option<String>,
    pub created_by_id: String,
    pub modified_by_id: String,
    pub created: String,
    pub modified: String,
}

impl From<Inventory> for InventoryResponse {
    fn from(inventory: Inventory) -> Self {
        Self {
            id: inventory.id,
            name: inventory.name,
            description: inventory.description,
            project_id: inventory.project_id,
            kind: inventory.kind,
            lines: inventory.lines,
            key_id: inventory.key_id,
            ssh_key_id: inventory.ssh_key_id,
            created_by_id: inventory.created_by_id,
            modified_by_id: inventory.modified_by_id,
            created: inventory.created.to_rfc3339(),
            modified: inventory.modified.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InventoryRemovalResponse {
    pub removed_groups: u64,
    pub removed_hosts: u64,
}

impl From<InventoryRemoval> for InventoryRemovalResponse {
    fn from(removal: InventoryRemoval) -> Self {
        Self {
            removed_groups: removal.removed_groups,
            removed_hosts: removal.removed_hosts,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InventoryListParams {
    pub project_id: Option<String>,
}
