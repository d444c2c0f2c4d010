use crate::dtos::CreateInventoryRequest;
use crate::error::{validation_reasons, InventoryError, InventoryResult};
use crate::models::{Activity, Inventory, InventoryKind};
use crate::services::activity::ActivityLog;
use crate::services::store::{self, Collection, DocumentStore, Filter};
use std::sync::Arc;
use validator::Validate;

const OBJECT_TYPE: &str = "inventory";

/// Counts removed alongside an inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryRemoval {
    pub removed_groups: u64,
    pub removed_hosts: u64,
}

#[derive(Clone)]
pub struct InventoryCatalog {
    store: Arc<dyn DocumentStore>,
    activity: Arc<dyn ActivityLog>,
}

impl InventoryCatalog {
    pub fn new(store: Arc<dyn DocumentStore>, activity: Arc<dyn ActivityLog>) -> Self {
        Self { store, activity }
    }

    pub async fn create(
        &self,
        request: CreateInventoryRequest,
        actor_id: &str,
    ) -> InventoryResult<Inventory> {
        let mut reasons = request
            .validate()
            .err()
            .map(|e| validation_reasons(&e))
            .unwrap_or_default();

        if let InventoryKind::CloudProvider(provider) = request.kind {
            if request.key_id.is_none() {
                reasons.push(format!(
                    "A {} inventory requires an access key credential.",
                    provider.as_str()
                ));
            }
        }
        for (label, credential_id) in [("Key", &request.key_id), ("SSH key", &request.ssh_key_id)]
        {
            if let Some(credential_id) = credential_id {
                if !store::exists(self.store.as_ref(), Collection::Credentials, credential_id)
                    .await?
                {
                    reasons.push(format!("{} credential does not exist.", label));
                }
            }
        }
        if !reasons.is_empty() {
            return Err(InventoryError::Validation(reasons));
        }

        let now = store::now();
        let inventory = Inventory {
            id: store::new_id(),
            name: request.name,
            description: request.description,
            project_id: request.project_id,
            kind: request.kind,
            lines: request.lines,
            key_id: request.key_id,
            ssh_key_id: request.ssh_key_id,
            created_by_id: actor_id.to_string(),
            modified_by_id: actor_id.to_string(),
            created: now,
            modified: now,
        };

        self.store
            .insert(Collection::Inventories, store::encode(&inventory)?)
            .await?;

        tracing::info!(inventory_id = %inventory.id, kind = ?inventory.kind, "Inventory created");
        self.activity
            .record(Activity::new(
                OBJECT_TYPE,
                &inventory.id,
                actor_id,
                format!("Inventory {} created", inventory.name),
            ))
            .await;
        Ok(inventory)
    }

    pub async fn get(&self, id: &str) -> InventoryResult<Inventory> {
        store::load(self.store.as_ref(), Collection::Inventories, id)
            .await?
            .ok_or_else(|| InventoryError::not_found(format!("Inventory {}", id)))
    }

    pub async fn list(&self, project_id: Option<&str>) -> InventoryResult<Vec<Inventory>> {
        let filter = match project_id {
            Some(project_id) => Filter::all().eq("project_id", project_id),
            None => Filter::all(),
        };
        Ok(store::load_all(self.store.as_ref(), Collection::Inventories, &filter).await?)
    }

    /// Remove the inventory with its hosts, then its groups.
    pub async fn delete(&self, id: &str, actor_id: &str) -> InventoryResult<InventoryRemoval> {
        let inventory = self.get(id).await?;
        let scope = Filter::all().eq("inventory_id", inventory.id.as_str());

        let removed_hosts = self.store.remove_all(Collection::Hosts, &scope).await?;
        let removed_groups = self.store.remove_all(Collection::Groups, &scope).await?;
        self.store
            .remove_by_id(Collection::Inventories, &inventory.id)
            .await?;

        tracing::info!(
            inventory_id = %inventory.id,
            groups = removed_groups,
            hosts = removed_hosts,
            "Inventory deleted"
        );
        self.activity
            .record(Activity::new(
                OBJECT_TYPE,
                &inventory.id,
                actor_id,
                format!("Inventory {} deleted", inventory.name),
            ))
            .await;

        Ok(InventoryRemoval {
            removed_groups,
            removed_hosts,
        })
    }
}
