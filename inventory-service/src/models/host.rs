use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub inventory_id: String,
    pub group_id: Option<String>,
    #[serde(default)]
    pub variables: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub created_by_id: String,
    pub modified_by_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified: DateTime<Utc>,
}

fn enabled_by_default() -> bool {
    true
}
