//! Grant-based authorization for credentials.
//!
//! A principal may act on a resource when it is a superuser, holds a user
//! grant at the required level, or belongs to a team holding one.

use crate::error::{InventoryError, InventoryResult};
use crate::models::{Credential, Principal, RoleGrant, RoleLevel, SubjectType, Team};
use crate::services::store::{self, Collection, DocumentStore, Filter};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Resolves which teams a user belongs to.
#[async_trait]
pub trait TeamResolver: Send + Sync {
    async fn teams_of(&self, user_id: &str) -> InventoryResult<HashSet<String>>;
}

/// Team membership read from the `teams` collection.
#[derive(Clone)]
pub struct StoreTeamResolver {
    store: Arc<dyn DocumentStore>,
}

impl StoreTeamResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TeamResolver for StoreTeamResolver {
    async fn teams_of(&self, user_id: &str) -> InventoryResult<HashSet<String>> {
        let teams: Vec<Team> = store::load_all(
            self.store.as_ref(),
            Collection::Teams,
            &Filter::all().eq("members", user_id),
        )
        .await?;
        Ok(teams.into_iter().map(|t| t.id).collect())
    }
}

/// Fixed membership table.
#[derive(Debug, Default, Clone)]
pub struct StaticTeamResolver {
    memberships: HashMap<String, HashSet<String>>,
}

impl StaticTeamResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(mut self, team_id: &str, user_id: &str) -> Self {
        self.memberships
            .entry(user_id.to_string())
            .or_default()
            .insert(team_id.to_string());
        self
    }
}

#[async_trait]
impl TeamResolver for StaticTeamResolver {
    async fn teams_of(&self, user_id: &str) -> InventoryResult<HashSet<String>> {
        Ok(self.memberships.get(user_id).cloned().unwrap_or_default())
    }
}

/// A resource guarded by role grants.
pub trait Guarded {
    fn resource_id(&self) -> &str;
    fn grants(&self) -> &[RoleGrant];
}

impl Guarded for Credential {
    fn resource_id(&self) -> &str {
        &self.id
    }

    fn grants(&self) -> &[RoleGrant] {
        &self.roles
    }
}

#[derive(Clone)]
pub struct AccessEvaluator {
    teams: Arc<dyn TeamResolver>,
}

impl AccessEvaluator {
    pub fn new(teams: Arc<dyn TeamResolver>) -> Self {
        Self { teams }
    }

    pub async fn can_read<R: Guarded + ?Sized>(
        &self,
        principal: &Principal,
        resource: &R,
    ) -> InventoryResult<bool> {
        self.has_level(principal, resource, RoleLevel::Read).await
    }

    pub async fn can_use<R: Guarded + ?Sized>(
        &self,
        principal: &Principal,
        resource: &R,
    ) -> InventoryResult<bool> {
        self.has_level(principal, resource, RoleLevel::Use).await
    }

    pub async fn can_write<R: Guarded + ?Sized>(
        &self,
        principal: &Principal,
        resource: &R,
    ) -> InventoryResult<bool> {
        self.has_level(principal, resource, RoleLevel::Admin).await
    }

    /// `Ok(())` when permitted, `Unauthorized` otherwise.
    pub async fn require<R: Guarded + ?Sized>(
        &self,
        principal: &Principal,
        resource: &R,
        required: RoleLevel,
    ) -> InventoryResult<()> {
        if self.has_level(principal, resource, required).await? {
            return Ok(());
        }
        tracing::warn!(
            user_id = %principal.user_id,
            resource_id = %resource.resource_id(),
            required = ?required,
            "Access denied"
        );
        Err(InventoryError::Unauthorized)
    }

    pub async fn has_level<R: Guarded + ?Sized>(
        &self,
        principal: &Principal,
        resource: &R,
        required: RoleLevel,
    ) -> InventoryResult<bool> {
        let grants = resource.grants();
        if principal.superuser || user_granted(principal, grants, required) {
            return Ok(true);
        }

        let team_grants: Vec<&RoleGrant> = grants
            .iter()
            .filter(|g| g.subject_type == SubjectType::Team && g.role.allows(required))
            .collect();
        if team_grants.is_empty() {
            return Ok(false);
        }

        let teams = self.teams.teams_of(&principal.user_id).await?;
        Ok(team_grants.iter().any(|g| teams.contains(&g.subject_id)))
    }
}

fn user_granted(principal: &Principal, grants: &[RoleGrant], required: RoleLevel) -> bool {
    grants.iter().any(|g| {
        g.names(SubjectType::User, &principal.user_id) && g.role.allows(required)
    })
}
