use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the activity stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "_id")]
    pub id: String,
    pub object_id: String,
    pub object_type: String,
    pub actor_id: String,
    pub description: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
}

impl Activity {
    pub fn new(
        object_type: &str,
        object_id: &str,
        actor_id: &str,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: crate::services::store::new_id(),
            object_id: object_id.to_string(),
            object_type: object_type.to_string(),
            actor_id: actor_id.to_string(),
            description: description.into(),
            created: crate::services::store::now(),
        }
    }
}
