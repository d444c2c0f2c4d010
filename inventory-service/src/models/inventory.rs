use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudProvider {
    Aws,
    DigitalOcean,
    Gcloud,
}

impl CloudProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::DigitalOcean => "digital_ocean",
            CloudProvider::Gcloud => "gcloud",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "provider", rename_all = "snake_case")]
pub enum InventoryKind {
    #[default]
    Static,
    CloudProvider(CloudProvider),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub project_id: Option<String>,
    #[serde(default)]
    pub kind: InventoryKind,
    /// Verbatim static inventory lines. Empty means render from the group tree.
    #[serde(default)]
    pub lines: Vec<String>,
    /// Credential used by a cloud provider resolver.
    pub key_id: Option<String>,
    /// Credential whose key is installed for the task.
    pub ssh_key_id: Option<String>,
    pub created_by_id: String,
    pub modified_by_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_adjacently_tagged() {
        assert_eq!(
            serde_json::to_value(InventoryKind::Static).unwrap(),
            serde_json::json!({ "type": "static" })
        );
        assert_eq!(
            serde_json::to_value(InventoryKind::CloudProvider(CloudProvider::DigitalOcean))
                .unwrap(),
            serde_json::json!({ "type": "cloud_provider", "provider": "digital_ocean" })
        );
    }
}
