use crate::dtos::{HostRequest, PatchHostRequest};
use crate::error::{validation_reasons, InventoryError, InventoryResult};
use crate::models::{parse_variables, Activity, Group, Host};
use crate::services::activity::ActivityLog;
use crate::services::groups::GroupTree;
use crate::services::store::{self, Collection, DocumentStore, Filter};
use serde_json::{Map, Value};
use std::sync::Arc;
use validator::Validate;

const OBJECT_TYPE: &str = "host";
const DUPLICATE_NAME: &str = "Host with this Name and Inventory already exists.";

#[derive(Clone)]
pub struct HostRegistry {
    store: Arc<dyn DocumentStore>,
    groups: Arc<GroupTree>,
    activity: Arc<dyn ActivityLog>,
}

impl HostRegistry {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        groups: Arc<GroupTree>,
        activity: Arc<dyn ActivityLog>,
    ) -> Self {
        Self {
            store,
            groups,
            activity,
        }
    }

    pub async fn create(&self, request: HostRequest, actor_id: &str) -> InventoryResult<Host> {
        let mut reasons = request
            .validate()
            .err()
            .map(|e| validation_reasons(&e))
            .unwrap_or_default();

        let now = store::now();
        let host = Host {
            id: store::new_id(),
            name: request.name,
            description: request.description,
            inventory_id: request.inventory_id,
            group_id: request.group_id,
            variables: request.variables,
            enabled: request.enabled,
            created_by_id: actor_id.to_string(),
            modified_by_id: actor_id.to_string(),
            created: now,
            modified: now,
        };

        reasons.extend(self.check(None, &host).await?);
        if !reasons.is_empty() {
            return Err(InventoryError::Validation(reasons));
        }

        self.store
            .insert(Collection::Hosts, store::encode(&host)?)
            .await
            .map_err(InventoryError::on_duplicate(DUPLICATE_NAME))?;

        tracing::info!(host_id = %host.id, inventory_id = %host.inventory_id, "Host created");
        self.activity
            .record(Activity::new(
                OBJECT_TYPE,
                &host.id,
                actor_id,
                format!("Host {} created", host.name),
            ))
            .await;
        Ok(host)
    }

    pub async fn update(
        &self,
        id: &str,
        request: HostRequest,
        actor_id: &str,
    ) -> InventoryResult<Host> {
        let existing = self.get(id).await?;
        let reasons = request
            .validate()
            .err()
            .map(|e| validation_reasons(&e))
            .unwrap_or_default();

        let candidate = Host {
            name: request.name,
            description: request.description,
            inventory_id: request.inventory_id,
            group_id: request.group_id,
            variables: request.variables,
            enabled: request.enabled,
            ..existing.clone()
        };
        self.save(existing, candidate, reasons, actor_id).await
    }

    pub async fn patch(
        &self,
        id: &str,
        patch: PatchHostRequest,
        actor_id: &str,
    ) -> InventoryResult<Host> {
        let existing = self.get(id).await?;
        let reasons = patch
            .validate()
            .err()
            .map(|e| validation_reasons(&e))
            .unwrap_or_default();

        let mut candidate = existing.clone();
        if let Some(name) = patch.name {
            candidate.name = name;
        }
        if let Some(description) = patch.description {
            candidate.description = description;
        }
        if let Some(inventory_id) = patch.inventory_id {
            candidate.inventory_id = inventory_id;
        }
        if let Some(group_id) = patch.group_id {
            candidate.group_id = group_id;
        }
        if let Some(variables) = patch.variables {
            candidate.variables = variables;
        }
        if let Some(enabled) = patch.enabled {
            candidate.enabled = enabled;
        }
        self.save(existing, candidate, reasons, actor_id).await
    }

    pub async fn delete(&self, id: &str, actor_id: &str) -> InventoryResult<()> {
        let host = self.get(id).await?;
        if !self.store.remove_by_id(Collection::Hosts, id).await? {
            return Err(InventoryError::not_found(format!("Host {}", id)));
        }
        tracing::info!(host_id = %id, "Host deleted");
        self.activity
            .record(Activity::new(
                OBJECT_TYPE,
                id,
                actor_id,
                format!("Host {} deleted", host.name),
            ))
            .await;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> InventoryResult<Host> {
        store::load(self.store.as_ref(), Collection::Hosts, id)
            .await?
            .ok_or_else(|| InventoryError::not_found(format!("Host {}", id)))
    }

    pub async fn list(
        &self,
        inventory_id: Option<&str>,
        group_id: Option<&str>,
    ) -> InventoryResult<Vec<Host>> {
        let mut filter = Filter::all();
        if let Some(inventory_id) = inventory_id {
            filter = filter.eq("inventory_id", inventory_id);
        }
        if let Some(group_id) = group_id {
            filter = filter.eq("group_id", group_id);
        }
        Ok(store::load_all(self.store.as_ref(), Collection::Hosts, &filter).await?)
    }

    pub async fn variables(&self, id: &str) -> InventoryResult<Map<String, Value>> {
        let host = self.get(id).await?;
        parse_variables(&host.variables).map_err(InventoryError::invalid)
    }

    /// The group the host is attached to, if any.
    pub async fn group(&self, id: &str) -> InventoryResult<Option<Group>> {
        let host = self.get(id).await?;
        match host.group_id {
            Some(group_id) => Ok(Some(self.groups.get(&group_id).await?)),
            None => Ok(None),
        }
    }

    /// The host's group followed by that group's ancestors.
    pub async fn all_groups(&self, id: &str) -> InventoryResult<Vec<Group>> {
        let Some(group) = self.group(id).await? else {
            return Ok(Vec::new());
        };
        let ancestors = self.groups.ancestors(&group.id).await?;
        let mut groups = Vec::with_capacity(ancestors.len() + 1);
        groups.push(group);
        groups.extend(ancestors);
        Ok(groups)
    }

    async fn save(
        &self,
        existing: Host,
        mut candidate: Host,
        mut reasons: Vec<String>,
        actor_id: &str,
    ) -> InventoryResult<Host> {
        reasons.extend(self.check(Some(&existing), &candidate).await?);
        if !reasons.is_empty() {
            return Err(InventoryError::Validation(reasons));
        }

        candidate.modified_by_id = actor_id.to_string();
        candidate.modified = store::now();
        let replaced = self
            .store
            .update_by_id(Collection::Hosts, &candidate.id, store::encode(&candidate)?)
            .await
            .map_err(InventoryError::on_duplicate(DUPLICATE_NAME))?;
        if !replaced {
            return Err(InventoryError::not_found(format!("Host {}", candidate.id)));
        }

        tracing::info!(host_id = %candidate.id, "Host updated");
        self.activity
            .record(Activity::new(
                OBJECT_TYPE,
                &candidate.id,
                actor_id,
                format!("Host {} updated", candidate.name),
            ))
            .await;
        Ok(candidate)
    }

    async fn check(&self, existing: Option<&Host>, candidate: &Host) -> InventoryResult<Vec<String>> {
        let mut reasons = Vec::new();

        if let Err(reason) = parse_variables(&candidate.variables) {
            reasons.push(reason);
        }

        let inventory_changed = existing.map_or(true, |e| e.inventory_id != candidate.inventory_id);
        let name_changed = existing.map_or(true, |e| e.name != candidate.name);

        if inventory_changed
            && !candidate.inventory_id.is_empty()
            && !store::exists(
                self.store.as_ref(),
                Collection::Inventories,
                &candidate.inventory_id,
            )
            .await?
        {
            reasons.push("Inventory does not exist.".to_string());
        }

        if (inventory_changed || name_changed) && !candidate.name.is_empty() {
            let clashes = self
                .store
                .find(
                    Collection::Hosts,
                    &Filter::all()
                        .eq("name", candidate.name.as_str())
                        .eq("inventory_id", candidate.inventory_id.as_str()),
                )
                .await?;
            if clashes
                .iter()
                .any(|d| d.get_str("_id").map_or(true, |id| id != candidate.id))
            {
                reasons.push(DUPLICATE_NAME.to_string());
            }
        }

        if let Some(group_id) = &candidate.group_id {
            let group: Option<Group> =
                store::load(self.store.as_ref(), Collection::Groups, group_id).await?;
            match group {
                None => reasons.push("Group does not exist.".to_string()),
                Some(group) if group.inventory_id != candidate.inventory_id => {
                    reasons.push("Group belongs to a different inventory.".to_string())
                }
                Some(_) => {}
            }
        }

        Ok(reasons)
    }
}
