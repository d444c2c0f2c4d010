pub mod activity;
pub mod credentials;
pub mod groups;
pub mod hosts;
pub mod inventories;

pub use activity::ActivityResponse;
pub use credentials::{
    CreateCredentialRequest, CredentialView, GrantRequest, RedactedSecrets, SecretInput,
    UpdateCredentialRequest,
};
pub use groups::{CascadeDeleteResponse, GroupRequest, GroupResponse, PatchGroupRequest};
pub use hosts::{HostRequest, HostResponse, PatchHostRequest};
pub use inventories::{CreateInventoryRequest, InventoryRemovalResponse, InventoryResponse};

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
/// in merge-patch bodies. Use with `#[serde(default)]`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
