use super::grant::{RoleGrant, SubjectType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Ssh,
    Net,
    Scm,
    Aws,
    Rax,
    Vmware,
    Gce,
    Azure,
    Openstack,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Ssh => "ssh",
            CredentialKind::Net => "net",
            CredentialKind::Scm => "scm",
            CredentialKind::Aws => "aws",
            CredentialKind::Rax => "rax",
            CredentialKind::Vmware => "vmware",
            CredentialKind::Gce => "gce",
            CredentialKind::Azure => "azure",
            CredentialKind::Openstack => "openstack",
        }
    }

    /// Field holding the key material written out for a task.
    pub fn key_material_field(&self) -> SecretField {
        match self {
            CredentialKind::Ssh | CredentialKind::Net | CredentialKind::Scm => {
                SecretField::SshKeyData
            }
            _ => SecretField::Password,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretField {
    Password,
    SshKeyData,
    SshKeyUnlock,
    BecomePassword,
    VaultPassword,
}

impl SecretField {
    pub const ALL: [SecretField; 5] = [
        SecretField::Password,
        SecretField::SshKeyData,
        SecretField::SshKeyUnlock,
        SecretField::BecomePassword,
        SecretField::VaultPassword,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecretField::Password => "password",
            SecretField::SshKeyData => "ssh_key_data",
            SecretField::SshKeyUnlock => "ssh_key_unlock",
            SecretField::BecomePassword => "become_password",
            SecretField::VaultPassword => "vault_password",
        }
    }
}

impl fmt::Display for SecretField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ciphertext of one secret field as persisted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SealedSecret(String);

impl SealedSecret {
    pub(crate) fn new(ciphertext: String) -> Self {
        Self(ciphertext)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SealedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SealedSecret(..)")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SealedSecrets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<SealedSecret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_data: Option<SealedSecret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_unlock: Option<SealedSecret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub become_password: Option<SealedSecret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_password: Option<SealedSecret>,
}

impl SealedSecrets {
    pub fn get(&self, field: SecretField) -> Option<&SealedSecret> {
        match field {
            SecretField::Password => self.password.as_ref(),
            SecretField::SshKeyData => self.ssh_key_data.as_ref(),
            SecretField::SshKeyUnlock => self.ssh_key_unlock.as_ref(),
            SecretField::BecomePassword => self.become_password.as_ref(),
            SecretField::VaultPassword => self.vault_password.as_ref(),
        }
    }

    pub fn set(&mut self, field: SecretField, value: Option<SealedSecret>) {
        let slot = match field {
            SecretField::Password => &mut self.password,
            SecretField::SshKeyData => &mut self.ssh_key_data,
            SecretField::SshKeyUnlock => &mut self.ssh_key_unlock,
            SecretField::BecomePassword => &mut self.become_password,
            SecretField::VaultPassword => &mut self.vault_password,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: CredentialKind,
    pub username: Option<String>,
    pub become_method: Option<String>,
    pub become_username: Option<String>,
    #[serde(default)]
    pub secrets: SealedSecrets,
    #[serde(default)]
    pub roles: Vec<RoleGrant>,
    pub created_by_id: String,
    pub modified_by_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified: DateTime<Utc>,
}

impl Credential {
    pub fn key_material_field(&self) -> SecretField {
        self.kind.key_material_field()
    }

    pub fn subjects(&self, subject_type: SubjectType) -> Vec<String> {
        self.roles
            .iter()
            .filter(|g| g.subject_type == subject_type)
            .map(|g| g.subject_id.clone())
            .collect()
    }
}
