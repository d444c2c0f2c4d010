//! Writes the files a task run needs into a per-task scratch directory.
//!
//! Every task gets `<scratch_root>/<task_id>/`, holding `inventory` and, when
//! the inventory names an SSH key credential, `ssh_key`. Both files and the
//! directory are owner-only. [`InventoryMaterializer::cleanup`] removes the
//! directory and may be called any number of times.

mod fs;
pub mod ini;

pub use fs::{ensure_private_dir, write_private_file, PRIVATE_DIR_MODE, PRIVATE_FILE_MODE};

use crate::error::{InventoryError, InventoryResult};
use crate::models::{CloudProvider, Credential, InventoryKind, Task};
use crate::services::groups::GroupTree;
use crate::services::hosts::HostRegistry;
use crate::services::vault::CredentialVault;
use async_trait::async_trait;
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const INVENTORY_FILE: &str = "inventory";
const KEY_FILE: &str = "ssh_key";
const MAX_TASK_ID_LEN: usize = 128;

/// Produces the inventory file for a cloud provider.
#[async_trait]
pub trait DynamicInventoryResolver: Send + Sync {
    async fn resolve(&self, task: &Task, dest: &Path) -> InventoryResult<()>;
}

/// Paths written for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskArtifacts {
    pub task_id: String,
    pub scratch_dir: PathBuf,
    pub inventory_path: PathBuf,
    pub key_path: Option<PathBuf>,
}

#[derive(Clone)]
pub struct InventoryMaterializer {
    vault: Arc<CredentialVault>,
    groups: Arc<GroupTree>,
    hosts: Arc<HostRegistry>,
    scratch_root: PathBuf,
    resolvers: HashMap<CloudProvider, Arc<dyn DynamicInventoryResolver>>,
}

impl InventoryMaterializer {
    pub fn new(
        vault: Arc<CredentialVault>,
        groups: Arc<GroupTree>,
        hosts: Arc<HostRegistry>,
        scratch_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            vault,
            groups,
            hosts,
            scratch_root: scratch_root.into(),
            resolvers: HashMap::new(),
        }
    }

    pub fn with_resolver(
        mut self,
        provider: CloudProvider,
        resolver: Arc<dyn DynamicInventoryResolver>,
    ) -> Self {
        self.resolvers.insert(provider, resolver);
        self
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Scratch directory of a task. Ids are restricted to ASCII letters,
    /// digits, `-` and `_` so they cannot escape the scratch root.
    pub fn task_dir(&self, task_id: &str) -> InventoryResult<PathBuf> {
        let valid = !task_id.is_empty()
            && task_id.len() <= MAX_TASK_ID_LEN
            && task_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(InventoryError::invalid(format!(
                "Task id {:?} is not a valid path segment.",
                task_id
            )));
        }
        Ok(self.scratch_root.join(task_id))
    }

    pub fn inventory_path(&self, task_id: &str) -> InventoryResult<PathBuf> {
        Ok(self.task_dir(task_id)?.join(INVENTORY_FILE))
    }

    pub fn key_path(&self, task_id: &str) -> InventoryResult<PathBuf> {
        Ok(self.task_dir(task_id)?.join(KEY_FILE))
    }

    /// Decrypt the credential's key material and write it to `dest` as an
    /// owner-only file, flushed before returning.
    pub async fn install_key(&self, credential: &Credential, dest: &Path) -> InventoryResult<()> {
        let field = credential.key_material_field();
        let material = self
            .vault
            .materialize_secret(credential, field)?
            .ok_or_else(|| {
                InventoryError::invalid(format!(
                    "Credential {} has no {} to install.",
                    credential.name, field
                ))
            })?;

        // Only a directory created here is narrowed to owner-only.
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !tokio::fs::try_exists(parent).await? {
                ensure_private_dir(parent).await?;
            }
        }
        write_private_file(dest, material.as_bytes()).await?;
        drop(material);

        tracing::info!(credential_id = %credential.id, path = ?dest, "Installed key material");
        Ok(())
    }

    /// Write the task's inventory (and key, if any) to its scratch directory.
    pub async fn install_inventory(&self, task: &Task) -> InventoryResult<TaskArtifacts> {
        let scratch_dir = self.task_dir(&task.id)?;
        ensure_private_dir(&scratch_dir).await?;
        metrics::counter!("materializations_started_total").increment(1);

        let key_path = match &task.inventory.ssh_key_id {
            Some(credential_id) => {
                let credential = self.vault.get(credential_id).await?;
                let path = scratch_dir.join(KEY_FILE);
                self.install_key(&credential, &path).await?;
                Some(path)
            }
            None => None,
        };

        let inventory_path = scratch_dir.join(INVENTORY_FILE);
        match task.inventory.kind {
            InventoryKind::Static => {
                let contents = self.static_contents(task).await?;
                write_private_file(&inventory_path, contents.as_bytes()).await?;
            }
            InventoryKind::CloudProvider(provider) => {
                let resolver = self.resolvers.get(&provider).ok_or_else(|| {
                    InventoryError::Unsupported(format!(
                        "no resolver registered for {} inventories",
                        provider.as_str()
                    ))
                })?;
                resolver.resolve(task, &inventory_path).await?;
                if !tokio::fs::try_exists(&inventory_path).await? {
                    return Err(InventoryError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("{} resolver wrote no inventory", provider.as_str()),
                    )));
                }
                fs::set_permissions(&inventory_path, PRIVATE_FILE_MODE).await?;
            }
        }

        tracing::info!(
            task_id = %task.id,
            inventory_id = %task.inventory.id,
            path = ?inventory_path,
            "Installed inventory"
        );
        Ok(TaskArtifacts {
            task_id: task.id.clone(),
            scratch_dir,
            inventory_path,
            key_path,
        })
    }

    /// Install everything for a task. On failure whatever was written is
    /// removed before the error is returned.
    pub async fn prepare(&self, task: &Task) -> InventoryResult<TaskArtifacts> {
        match self.install_inventory(task).await {
            Ok(artifacts) => Ok(artifacts),
            Err(e) => {
                tracing::error!(task_id = %task.id, error = %e, "Failed to materialize task files");
                metrics::counter!("materializations_failed_total").increment(1);
                if let Err(cleanup_err) = self.cleanup(&task.id).await {
                    tracing::warn!(task_id = %task.id, error = %cleanup_err, "Cleanup after failed materialization failed");
                }
                Err(e)
            }
        }
    }

    /// Prepare the task, run `run` with its artifacts and clean up afterwards,
    /// whether `run` returns, fails or panics.
    pub async fn run_with_artifacts<F, Fut, T>(&self, task: &Task, run: F) -> InventoryResult<T>
    where
        F: FnOnce(TaskArtifacts) -> Fut,
        Fut: Future<Output = InventoryResult<T>>,
    {
        let artifacts = self.prepare(task).await?;
        let outcome = AssertUnwindSafe(run(artifacts)).catch_unwind().await;

        if let Err(e) = self.cleanup(&task.id).await {
            tracing::warn!(task_id = %task.id, error = %e, "Failed to clean up task files");
        }

        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Remove the task's scratch directory. Removing an absent directory
    /// succeeds.
    pub async fn cleanup(&self, task_id: &str) -> InventoryResult<()> {
        let dir = self.task_dir(task_id)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::debug!(task_id = %task_id, "Removed task scratch directory");
                metrics::counter!("materialization_cleanups_total").increment(1);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn static_contents(&self, task: &Task) -> InventoryResult<String> {
        let inventory = &task.inventory;
        if !inventory.lines.is_empty() {
            let mut contents = inventory.lines.join("\n");
            contents.push('\n');
            return Ok(contents);
        }

        let groups = self.groups.list(Some(&inventory.id)).await?;
        let hosts = self.hosts.list(Some(&inventory.id), None).await?;
        Ok(ini::render(&groups, &hosts))
    }
}
