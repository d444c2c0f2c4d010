mod activity;
mod credential;
mod grant;
mod group;
mod host;
mod inventory;
mod principal;
mod task;
mod team;

pub use activity::Activity;
pub use credential::{Credential, CredentialKind, SealedSecret, SealedSecrets, SecretField};
pub use grant::{RoleGrant, RoleLevel, SubjectType};
pub use group::{CascadeSummary, Group};
pub use host::Host;
pub use inventory::{CloudProvider, Inventory, InventoryKind};
pub use principal::Principal;
pub use task::Task;
pub use team::Team;

use serde_json::{Map, Value};

/// Parse a stored variables blob. Blank means no variables; anything else
/// must be a JSON object.
pub fn parse_variables(raw: &str) -> Result<Map<String, Value>, String> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("Variables must be a JSON object.".to_string()),
        Err(e) => Err(format!("Variables are not valid JSON: {}", e)),
    }
}
