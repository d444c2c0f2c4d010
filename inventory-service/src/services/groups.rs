//! Groups form a forest per inventory through `parent_group_id`.
//!
//! The store does not enforce acyclicity, so every walk up or down the tree
//! tracks what it has visited.

use crate::dtos::{GroupRequest, PatchGroupRequest};
use crate::error::{validation_reasons, InventoryError, InventoryResult};
use crate::models::{parse_variables, Activity, CascadeSummary, Group};
use crate::services::activity::ActivityLog;
use crate::services::store::{self, Collection, DocumentStore, Filter};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;

const OBJECT_TYPE: &str = "group";
const DUPLICATE_NAME: &str = "Group with this Name and Inventory already exists.";

#[derive(Clone)]
pub struct GroupTree {
    store: Arc<dyn DocumentStore>,
    activity: Arc<dyn ActivityLog>,
}

impl GroupTree {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        activity: Arc<dyn ActivityLog>,
    ) -> Self {
        Self { store, activity }
    }

    pub async fn create(&self, request: GroupRequest, actor_id: &str) -> InventoryResult<Group> {
        let mut reasons = request
            .validate()
            .err()
            .map(|e| validation_reasons(&e))
            .unwrap_or_default();

        let now = store::now();
        let group = Group {
            id: store::new_id(),
            name: request.name,
            description: request.description,
            inventory_id: request.inventory_id,
            parent_group_id: request.parent_group_id,
            variables: request.variables,
            created_by_id: actor_id.to_string(),
            modified_by_id: actor_id.to_string(),
            created: now,
            modified: now,
        };

        reasons.extend(self.check(None, &group).await?);
        if !reasons.is_empty() {
            return Err(InventoryError::Validation(reasons));
        }

        self.store
            .insert(Collection::Groups, store::encode(&group)?)
            .await
            .map_err(InventoryError::on_duplicate(DUPLICATE_NAME))?;

        tracing::info!(group_id = %group.id, inventory_id = %group.inventory_id, "Group created");
        self.activity
            .record(Activity::new(
                OBJECT_TYPE,
                &group.id,
                actor_id,
                format!("Group {} created", group.name),
            ))
            .await;
        Ok(group)
    }

    /// Replace every mutable field. An absent parent makes the group a root.
    pub async fn update(
        &self,
        id: &str,
        request: GroupRequest,
        actor_id: &str,
    ) -> InventoryResult<Group> {
        let existing = self.get(id).await?;
        let reasons = request
            .validate()
            .err()
            .map(|e| validation_reasons(&e))
            .unwrap_or_default();

        let candidate = Group {
            name: request.name,
            description: request.description,
            inventory_id: request.inventory_id,
            parent_group_id: request.parent_group_id,
            variables: request.variables,
            ..existing.clone()
        };
        self.save(existing, candidate, reasons, actor_id).await
    }

    /// Merge patch: absent fields are kept, explicit `null` clears.
    pub async fn patch(
        &self,
        id: &str,
        patch: PatchGroupRequest,
        actor_id: &str,
    ) -> InventoryResult<Group> {
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
        if let Some(parent_group_id) = patch.parent_group_id {
            candidate.parent_group_id = parent_group_id;
        }
        if let Some(variables) = patch.variables {
            candidate.variables = variables;
        }
        self.save(existing, candidate, reasons, actor_id).await
    }

    /// Remove a group, every group reachable below it and every host in any
    /// of them. Hosts go first; if that fails no group is removed.
    pub async fn cascade_delete(&self, id: &str, actor_id: &str) -> InventoryResult<CascadeSummary> {
        let root = self.get(id).await?;
        let group_ids = self.descendant_closure(&root.id).await?;

        let removed_host_count = self
            .store
            .remove_all(
                Collection::Hosts,
                &Filter::all().within("group_id", group_ids.iter().map(String::as_str)),
            )
            .await
            .map_err(|e| {
                tracing::error!(group_id = %root.id, error = %e, "Failed to remove hosts during cascade");
                e
            })?;

        self.store
            .remove_all(
                Collection::Groups,
                &Filter::all().within("_id", group_ids.iter().map(String::as_str)),
            )
            .await
            .map_err(|e| {
                tracing::error!(group_id = %root.id, error = %e, "Failed to remove groups during cascade");
                e
            })?;

        tracing::info!(
            group_id = %root.id,
            groups = group_ids.len(),
            hosts = removed_host_count,
            "Group cascade delete complete"
        );
        metrics::counter!("groups_cascaded_total").increment(group_ids.len() as u64);
        metrics::counter!("hosts_cascaded_total").increment(removed_host_count);
        self.activity
            .record(Activity::new(
                OBJECT_TYPE,
                &root.id,
                actor_id,
                format!(
                    "Group {} deleted with {} descendant groups and {} hosts",
                    root.name,
                    group_ids.len() - 1,
                    removed_host_count
                ),
            ))
            .await;

        Ok(CascadeSummary {
            removed_group_ids: group_ids,
            removed_host_count,
        })
    }

    /// Parent chain from the immediate parent to the root.
    pub async fn ancestors(&self, id: &str) -> InventoryResult<Vec<Group>> {
        let start = self.get(id).await?;
        let mut visited = HashSet::from([start.id.clone()]);
        let mut chain = Vec::new();
        let mut next = start.parent_group_id;

        while let Some(parent_id) = next {
            if !visited.insert(parent_id.clone()) {
                tracing::warn!(group_id = %id, cycle_at = %parent_id, "Cycle in group parent chain");
                return Err(InventoryError::CycleDetected {
                    group_id: parent_id,
                });
            }
            let parent: Group = store::load(self.store.as_ref(), Collection::Groups, &parent_id)
                .await?
                .ok_or_else(|| InventoryError::not_found(format!("Parent group {}", parent_id)))?;
            next = parent.parent_group_id.clone();
            chain.push(parent);
        }

        Ok(chain)
    }

    pub async fn get(&self, id: &str) -> InventoryResult<Group> {
        store::load(self.store.as_ref(), Collection::Groups, id)
            .await?
            .ok_or_else(|| InventoryError::not_found(format!("Group {}", id)))
    }

    pub async fn list(&self, inventory_id: Option<&str>) -> InventoryResult<Vec<Group>> {
        let filter = match inventory_id {
            Some(inventory_id) => Filter::all().eq("inventory_id", inventory_id),
            None => Filter::all(),
        };
        Ok(store::load_all(self.store.as_ref(), Collection::Groups, &filter).await?)
    }

    pub async fn children(&self, id: &str) -> InventoryResult<Vec<Group>> {
        let group = self.get(id).await?;
        Ok(store::load_all(
            self.store.as_ref(),
            Collection::Groups,
            &Filter::all().eq("parent_group_id", group.id.as_str()),
        )
        .await?)
    }

    pub async fn variables(&self, id: &str) -> InventoryResult<Map<String, Value>> {
        let group = self.get(id).await?;
        parse_variables(&group.variables).map_err(InventoryError::invalid)
    }

    /// Ids of `root` and every group below it, breadth first.
    async fn descendant_closure(&self, root: &str) -> InventoryResult<Vec<String>> {
        let mut closure = vec![root.to_string()];
        let mut seen: HashSet<String> = HashSet::from([root.to_string()]);
        let mut frontier = closure.clone();

        while !frontier.is_empty() {
            let children: Vec<Group> = store::load_all(
                self.store.as_ref(),
                Collection::Groups,
                &Filter::all().within("parent_group_id", frontier.iter().map(String::as_str)),
            )
            .await?;

            frontier = children
                .into_iter()
                .map(|g| g.id)
                .filter(|id| seen.insert(id.clone()))
                .collect();
            closure.extend(frontier.iter().cloned());
        }

        Ok(closure)
    }

    async fn save(
        &self,
        existing: Group,
        mut candidate: Group,
        mut reasons: Vec<String>,
        actor_id: &str,
    ) -> InventoryResult<Group> {
        reasons.extend(self.check(Some(&existing), &candidate).await?);
        if !reasons.is_empty() {
            return Err(InventoryError::Validation(reasons));
        }

        candidate.modified_by_id = actor_id.to_string();
        candidate.modified = store::now();
        let replaced = self
            .store
            .update_by_id(Collection::Groups, &candidate.id, store::encode(&candidate)?)
            .await
            .map_err(InventoryError::on_duplicate(DUPLICATE_NAME))?;
        if !replaced {
            return Err(InventoryError::not_found(format!("Group {}", candidate.id)));
        }

        tracing::info!(group_id = %candidate.id, "Group updated");
        self.activity
            .record(Activity::new(
                OBJECT_TYPE,
                &candidate.id,
                actor_id,
                format!("Group {} updated", candidate.name),
            ))
            .await;
        Ok(candidate)
    }

    /// Store-dependent rules for a group about to be written.
    async fn check(&self, existing: Option<&Group>, candidate: &Group) -> InventoryResult<Vec<String>> {
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
                    Collection::Groups,
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

        if let Some(parent_id) = &candidate.parent_group_id {
            if *parent_id == candidate.id {
                reasons.push("A group cannot be its own parent.".to_string());
            } else {
                let parent: Option<Group> =
                    store::load(self.store.as_ref(), Collection::Groups, parent_id).await?;
                match parent {
                    None => reasons.push("Parent Group does not exist.".to_string()),
                    Some(parent) if parent.inventory_id != candidate.inventory_id => {
                        reasons.push("Parent Group belongs to a different inventory.".to_string())
                    }
                    Some(parent) if existing.is_some() => {
                        let lineage = self.ancestors(&parent.id).await?;
                        if lineage.iter().any(|g| g.id == candidate.id) {
                            reasons.push(
                                "Parent Group cannot be a descendant of the group.".to_string(),
                            );
                        }
                    }
                    Some(_) => {}
                }
            }
        }

        if existing.is_some() && inventory_changed {
            let children = self
                .store
                .find(
                    Collection::Groups,
                    &Filter::all().eq("parent_group_id", candidate.id.as_str()),
                )
                .await?;
            let hosts = self
                .store
                .find(
                    Collection::Hosts,
                    &Filter::all().eq("group_id", candidate.id.as_str()),
                )
                .await?;
            if !children.is_empty() || !hosts.is_empty() {
                reasons.push(
                    "A group with child groups or hosts cannot move to another inventory."
                        .to_string(),
                );
            }
        }

        Ok(reasons)
    }
}
