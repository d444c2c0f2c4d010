use crate::models::Activity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub id: String,
    pub object_id: String,
    pub object_type: String,
    pub actor_id: String,
    pub description: String,
    pub created: String,
}

impl From<Activity> for ActivityResponse {
    fn from(activity: Activity) -> Self {
        Self {
            id: activity.id,
            object_id: activity.object_id,
            object_type: activity.object_type,
            actor_id: activity.actor_id,
            description: activity.description,
            created: activity.created.to_rfc3339(),
        }
    }
}
