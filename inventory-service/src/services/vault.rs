//! Credential storage with per-field secret encryption.
//!
//! Secret fields are sealed before they reach the store and only leave the
//! vault as plaintext through [`CredentialVault::materialize_secret`].

use crate::cipher::SecretCipher;
use crate::dtos::{CreateCredentialRequest, CredentialView, SecretInput, UpdateCredentialRequest};
use crate::error::{validation_reasons, InventoryError, InventoryResult};
use crate::models::{
    Activity, Credential, CredentialKind, Principal, RoleGrant, RoleLevel, SealedSecret,
    SealedSecrets, SecretField, SubjectType,
};
use crate::services::access::AccessEvaluator;
use crate::services::activity::ActivityLog;
use crate::services::store::{self, Collection, DocumentStore, Filter};
use secrecy::ExposeSecret;
use std::sync::Arc;
use validator::Validate;
use zeroize::Zeroizing;

const OBJECT_TYPE: &str = "credential";

#[derive(Clone)]
pub struct CredentialVault {
    store: Arc<dyn DocumentStore>,
    cipher: Arc<SecretCipher>,
    activity: Arc<dyn ActivityLog>,
}

impl CredentialVault {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cipher: Arc<SecretCipher>,
        activity: Arc<dyn ActivityLog>,
    ) -> Self {
        Self {
            store,
            cipher,
            activity,
        }
    }

    /// Store a new credential owned by `owner_id`, who receives an admin grant.
    pub async fn create(
        &self,
        request: CreateCredentialRequest,
        owner_id: &str,
    ) -> InventoryResult<Credential> {
        let mut reasons = request
            .validate()
            .err()
            .map(|e| validation_reasons(&e))
            .unwrap_or_default();
        if has_value(&request.secrets, SecretField::SshKeyUnlock)
            && !has_value(&request.secrets, SecretField::SshKeyData)
        {
            reasons.push(unlock_without_key());
        }
        if !reasons.is_empty() {
            return Err(InventoryError::Validation(reasons));
        }

        let mut secrets = SealedSecrets::default();
        for field in SecretField::ALL {
            if let Some(value) = request.secrets.get(field) {
                let value = value.expose_secret();
                if !value.is_empty() {
                    secrets.set(field, Some(self.seal(value)?));
                }
            }
        }

        let now = store::now();
        let credential = Credential {
            id: store::new_id(),
            name: request.name,
            description: request.description,
            kind: request.kind,
            username: request.username,
            become_method: request.become_method,
            become_username: request.become_username,
            secrets,
            roles: vec![RoleGrant::user(owner_id, RoleLevel::Admin)],
            created_by_id: owner_id.to_string(),
            modified_by_id: owner_id.to_string(),
            created: now,
            modified: now,
        };

        self.store
            .insert(Collection::Credentials, store::encode(&credential)?)
            .await?;

        tracing::info!(
            credential_id = %credential.id,
            kind = credential.kind.as_str(),
            "Credential created"
        );
        metrics::counter!("credentials_created_total", "kind" => credential.kind.as_str())
            .increment(1);
        self.activity
            .record(Activity::new(
                OBJECT_TYPE,
                &credential.id,
                owner_id,
                format!("Credential {} created", credential.name),
            ))
            .await;

        Ok(credential)
    }

    /// Apply a merge patch. Secret fields absent from the patch keep their
    /// stored ciphertext.
    pub async fn update(
        &self,
        id: &str,
        patch: UpdateCredentialRequest,
        editor_id: &str,
    ) -> InventoryResult<Credential> {
        let mut credential = self.get(id).await?;

        let mut reasons = patch
            .validate()
            .err()
            .map(|e| validation_reasons(&e))
            .unwrap_or_default();

        if let Some(name) = patch.name {
            credential.name = name;
        }
        if let Some(description) = patch.description {
            credential.description = description;
        }
        if let Some(kind) = patch.kind {
            credential.kind = kind;
        }
        if let Some(username) = patch.username {
            credential.username = username;
        }
        if let Some(become_method) = patch.become_method {
            credential.become_method = become_method;
        }
        if let Some(become_username) = patch.become_username {
            credential.become_username = become_username;
        }

        for field in SecretField::ALL {
            if let Some(value) = patch.secrets.get(field) {
                let value = value.expose_secret();
                let sealed = if value.is_empty() {
                    None
                } else {
                    Some(self.seal(value)?)
                };
                credential.secrets.set(field, sealed);
            }
        }

        if credential.secrets.ssh_key_unlock.is_some() && credential.secrets.ssh_key_data.is_none()
        {
            reasons.push(unlock_without_key());
        }
        if !reasons.is_empty() {
            return Err(InventoryError::Validation(reasons));
        }

        credential.modified_by_id = editor_id.to_string();
        credential.modified = store::now();
        self.save(&credential).await?;

        tracing::info!(credential_id = %credential.id, "Credential updated");
        metrics::counter!("credentials_updated_total").increment(1);
        self.activity
            .record(Activity::new(
                OBJECT_TYPE,
                &credential.id,
                editor_id,
                format!("Credential {} updated", credential.name),
            ))
            .await;

        Ok(credential)
    }

    /// The credential with every secret field nulled.
    pub fn redact(credential: &Credential) -> CredentialView {
        CredentialView::from(credential)
    }

    /// Decrypt one secret field. `None` when the field is not set.
    pub fn materialize_secret(
        &self,
        credential: &Credential,
        field: SecretField,
    ) -> InventoryResult<Option<Zeroizing<String>>> {
        let Some(sealed) = credential.secrets.get(field) else {
            return Ok(None);
        };
        let plaintext = self.cipher.decrypt(sealed.as_str()).map_err(|e| {
            tracing::error!(
                credential_id = %credential.id,
                field = field.as_str(),
                error = %e,
                "Failed to decrypt credential field"
            );
            e
        })?;
        Ok(Some(plaintext))
    }

    pub async fn delete(&self, id: &str, actor_id: &str) -> InventoryResult<()> {
        let credential = self.get(id).await?;
        if !self.store.remove_by_id(Collection::Credentials, id).await? {
            return Err(InventoryError::not_found(format!("Credential {}", id)));
        }

        tracing::info!(credential_id = %id, "Credential deleted");
        metrics::counter!("credentials_deleted_total").increment(1);
        self.activity
            .record(Activity::new(
                OBJECT_TYPE,
                id,
                actor_id,
                format!("Credential {} deleted", credential.name),
            ))
            .await;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> InventoryResult<Credential> {
        store::load(self.store.as_ref(), Collection::Credentials, id)
            .await?
            .ok_or_else(|| InventoryError::not_found(format!("Credential {}", id)))
    }

    /// Load a credential and check the principal holds `required` on it.
    /// A missing credential is `NotFound`; an ungranted one is `Unauthorized`.
    pub async fn authorize(
        &self,
        access: &AccessEvaluator,
        principal: &Principal,
        id: &str,
        required: RoleLevel,
    ) -> InventoryResult<Credential> {
        let credential = self.get(id).await?;
        access.require(principal, &credential, required).await?;
        Ok(credential)
    }

    /// Credentials the principal may read, redacted.
    pub async fn list(
        &self,
        access: &AccessEvaluator,
        principal: &Principal,
        kind: Option<CredentialKind>,
    ) -> InventoryResult<Vec<CredentialView>> {
        let filter = match kind {
            Some(kind) => Filter::all().eq("kind", kind.as_str()),
            None => Filter::all(),
        };
        let credentials: Vec<Credential> =
            store::load_all(self.store.as_ref(), Collection::Credentials, &filter).await?;

        let mut visible = Vec::new();
        for credential in &credentials {
            if access.can_read(principal, credential).await? {
                visible.push(Self::redact(credential));
            }
        }
        Ok(visible)
    }

    /// Add a grant, replacing any existing grant for the same subject.
    pub async fn grant(
        &self,
        id: &str,
        grant: RoleGrant,
        actor_id: &str,
    ) -> InventoryResult<Credential> {
        if grant.subject_id.trim().is_empty() {
            return Err(InventoryError::invalid("Subject is required."));
        }

        let mut credential = self.get(id).await?;
        credential
            .roles
            .retain(|g| !g.names(grant.subject_type, &grant.subject_id));
        let description = format!(
            "Granted {:?} on credential {} to {:?} {}",
            grant.role, credential.name, grant.subject_type, grant.subject_id
        );
        credential.roles.push(grant);
        credential.modified_by_id = actor_id.to_string();
        credential.modified = store::now();
        self.save(&credential).await?;

        self.activity
            .record(Activity::new(OBJECT_TYPE, &credential.id, actor_id, description))
            .await;
        Ok(credential)
    }

    pub async fn revoke(
        &self,
        id: &str,
        subject_type: SubjectType,
        subject_id: &str,
        actor_id: &str,
    ) -> InventoryResult<Credential> {
        let mut credential = self.get(id).await?;
        let before = credential.roles.len();
        credential
            .roles
            .retain(|g| !g.names(subject_type, subject_id));
        if credential.roles.len() == before {
            return Err(InventoryError::not_found(format!(
                "Grant for {:?} {}",
                subject_type, subject_id
            )));
        }

        credential.modified_by_id = actor_id.to_string();
        credential.modified = store::now();
        self.save(&credential).await?;

        self.activity
            .record(Activity::new(
                OBJECT_TYPE,
                &credential.id,
                actor_id,
                format!("Revoked access to {:?} {}", subject_type, subject_id),
            ))
            .await;
        Ok(credential)
    }

    pub fn owner_users(credential: &Credential) -> Vec<String> {
        credential.subjects(SubjectType::User)
    }

    pub fn owner_teams(credential: &Credential) -> Vec<String> {
        credential.subjects(SubjectType::Team)
    }

    fn seal(&self, plaintext: &str) -> InventoryResult<SealedSecret> {
        Ok(SealedSecret::new(self.cipher.encrypt(plaintext)?))
    }

    async fn save(&self, credential: &Credential) -> InventoryResult<()> {
        let replaced = self
            .store
            .update_by_id(
                Collection::Credentials,
                &credential.id,
                store::encode(credential)?,
            )
            .await?;
        if !replaced {
            return Err(InventoryError::not_found(format!(
                "Credential {}",
                credential.id
            )));
        }
        Ok(())
    }
}

fn has_value(input: &SecretInput, field: SecretField) -> bool {
    input
        .get(field)
        .is_some_and(|v| !v.expose_secret().is_empty())
}

fn unlock_without_key() -> String {
    "SSH key unlock requires SSH key data.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::activity::StoreActivityLog;
    use crate::services::store::MemoryStore;

    fn vault() -> (CredentialVault, MemoryStore) {
        let store = MemoryStore::new();
        let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
        let cipher = SecretCipher::new(*SecretCipher::generate_key());
        let vault = CredentialVault::new(
            shared.clone(),
            Arc::new(cipher),
            Arc::new(StoreActivityLog::new(shared)),
        );
        (vault, store)
    }

    #[tokio::test]
    async fn stored_document_holds_ciphertext_only() {
        let (vault, store) = vault();
        let mut request = CreateCredentialRequest::new("prod", CredentialKind::Ssh);
        request.secrets = SecretInput::default().with(SecretField::Password, "hunter2");

        let credential = vault.create(request, "alice").await.unwrap();
        let raw = store
            .find_by_id(Collection::Credentials, &credential.id)
            .await
            .unwrap()
            .unwrap();

        assert!(!raw.to_string().contains("hunter2"));
        assert_eq!(
            vault
                .materialize_secret(&credential, SecretField::Password)
                .unwrap()
                .unwrap()
                .as_str(),
            "hunter2"
        );
    }

    #[tokio::test]
    async fn unlock_needs_key_data() {
        let (vault, store) = vault();
        let mut request = CreateCredentialRequest::new("prod", CredentialKind::Ssh);
        request.secrets = SecretInput::default().with(SecretField::SshKeyUnlock, "phrase");

        let err = vault.create(request, "alice").await.unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
        assert_eq!(store.count(Collection::Credentials), 0);
    }

    #[tokio::test]
    async fn missing_key_fails_before_persisting() {
        let store = MemoryStore::new();
        let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
        let vault = CredentialVault::new(
            shared.clone(),
            Arc::new(SecretCipher::unavailable()),
            Arc::new(StoreActivityLog::new(shared)),
        );
        let mut request = CreateCredentialRequest::new("prod", CredentialKind::Ssh);
        request.secrets = SecretInput::default().with(SecretField::Password, "pw");

        let err = vault.create(request, "alice").await.unwrap_err();
        assert!(matches!(err, InventoryError::Cipher(_)));
        assert_eq!(store.count(Collection::Credentials), 0);
    }

    #[tokio::test]
    async fn grant_replaces_existing_subject() {
        let (vault, _) = vault();
        let credential = vault
            .create(CreateCredentialRequest::new("c", CredentialKind::Aws), "alice")
            .await
            .unwrap();

        vault
            .grant(&credential.id, RoleGrant::team("ops", RoleLevel::Read), "alice")
            .await
            .unwrap();
        let updated = vault
            .grant(&credential.id, RoleGrant::team("ops", RoleLevel::Use), "alice")
            .await
            .unwrap();

        assert_eq!(CredentialVault::owner_teams(&updated), vec!["ops".to_string()]);
        assert!(updated.roles.contains(&RoleGrant::team("ops", RoleLevel::Use)));
        assert_eq!(CredentialVault::owner_users(&updated), vec!["alice".to_string()]);

        let revoked = vault
            .revoke(&credential.id, SubjectType::Team, "ops", "alice")
            .await
            .unwrap();
        assert!(CredentialVault::owner_teams(&revoked).is_empty());
    }
}
