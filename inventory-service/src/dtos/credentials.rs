use super::nullable;
use crate::models::{Credential, CredentialKind, RoleGrant, RoleLevel, SecretField, SubjectType};
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Plaintext secret fields as they arrive on a request. Values stay wrapped
/// until the vault encrypts them.
#[derive(Debug, Default, Deserialize)]
pub struct SecretInput {
    #[serde(default)]
    pub password: Option<Secret<String>>,
    #[serde(default)]
    pub ssh_key_data: Option<Secret<String>>,
    #[serde(default)]
    pub ssh_key_unlock: Option<Secret<String>>,
    #[serde(default)]
    pub become_password: Option<Secret<String>>,
    #[serde(default)]
    pub vault_password: Option<Secret<String>>,
}

impl SecretInput {
    pub fn get(&self, field: SecretField) -> Option<&Secret<String>> {
        match field {
            SecretField::Password => self.password.as_ref(),
            SecretField::SshKeyData => self.ssh_key_data.as_ref(),
            SecretField::SshKeyUnlock => self.ssh_key_unlock.as_ref(),
            SecretField::BecomePassword => self.become_password.as_ref(),
            SecretField::VaultPassword => self.vault_password.as_ref(),
        }
    }

    pub fn with(mut self, field: SecretField, value: &str) -> Self {
        let value = Some(Secret::new(value.to_string()));
        match field {
            SecretField::Password => self.password = value,
            SecretField::SshKeyData => self.ssh_key_data = value,
            SecretField::SshKeyUnlock => self.ssh_key_unlock = value,
            SecretField::BecomePassword => self.become_password = value,
            SecretField::VaultPassword => self.vault_password = value,
        }
        self
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCredentialRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required."))]
    pub name: String,
    pub description: Option<String>,
    pub kind: CredentialKind,
    pub username: Option<String>,
    pub become_method: Option<String>,
    pub become_username: Option<String>,
    #[serde(flatten)]
    pub secrets: SecretInput,
}

impl CreateCredentialRequest {
    pub fn new(name: impl Into<String>, kind: CredentialKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            username: None,
            become_method: None,
            become_username: None,
            secrets: SecretInput::default(),
        }
    }
}

/// Merge patch of a credential. Omitted fields are kept; `null` clears a
/// nullable field. A secret set to `""` is cleared, any other value is
/// re-encrypted.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCredentialRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required."))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub kind: Option<CredentialKind>,
    #[serde(default, deserialize_with = "nullable")]
    pub username: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub become_method: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub become_username: Option<Option<String>>,
    #[serde(flatten)]
    pub secrets: SecretInput,
}

/// Secret fields in an outbound credential. Always serialized as `null`.
#[derive(Debug, Default, Serialize)]
pub struct RedactedSecrets {
    password: Option<String>,
    ssh_key_data: Option<String>,
    ssh_key_unlock: Option<String>,
    become_password: Option<String>,
    vault_password: Option<String>,
}

/// A credential as shown to callers.
#[derive(Debug, Serialize)]
pub struct CredentialView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: CredentialKind,
    pub username: Option<String>,
    pub become_method: Option<String>,
    pub become_username: Option<String>,
    #[serde(flatten)]
    pub secrets: RedactedSecrets,
    pub roles: Vec<RoleGrant>,
    pub created_by_id: String,
    pub modified_by_id: String,
    pub created: String,
    pub modified: String,
}

impl From<&Credential> for CredentialView {
    fn from(credential: &Credential) -> Self {
        Self {
            id: credential.id.clone(),
            name: credential.name.clone(),
            description: credential.description.clone(),
            kind: credential.kind,
            username: credential.username.clone(),
            become_method: credential.become_method.clone(),
            become_username: credential.become_username.clone(),
            secrets: RedactedSecrets::default(),
            roles: credential.roles.clone(),
            created_by_id: credential.created_by_id.clone(),
            modified_by_id: credential.modified_by_id.clone(),
            created: credential.created.to_rfc3339(),
            modified: credential.modified.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GrantRequest {
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    #[validate(length(min = 1, message = "Subject is required."))]
    pub subject_id: String,
    pub role: RoleLevel,
}

impl From<GrantRequest> for RoleGrant {
    fn from(request: GrantRequest) -> Self {
        RoleGrant {
            subject_type: request.subject_type,
            subject_id: request.subject_id,
            role: request.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CredentialListParams {
    pub kind: Option<CredentialKind>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn patch_distinguishes_absent_null_and_value() {
        let patch: UpdateCredentialRequest = serde_json::from_value(serde_json::json!({
            "description": null,
            "username": "deploy",
            "password": "s3cret"
        }))
        .unwrap();

        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.username, Some(Some("deploy".to_string())));
        assert_eq!(patch.become_method, None);
        assert!(patch.name.is_none());
        assert_eq!(
            patch.secrets.get(SecretField::Password).unwrap().expose_secret(),
            "s3cret"
        );
        assert!(patch.secrets.get(SecretField::SshKeyData).is_none());
    }

    #[test]
    fn secret_input_debug_is_redacted() {
        let input = SecretInput::default().with(SecretField::Password, "hunter2");
        assert!(!format!("{:?}", input).contains("hunter2"));
    }

    #[test]
    fn redacted_secrets_serialize_as_null() {
        let json = serde_json::to_value(RedactedSecrets::default()).unwrap();
        for field in SecretField::ALL {
            assert!(json[field.as_str()].is_null());
        }
    }
}
