use crate::error::InventoryResult;
use crate::models::Activity;
use crate::services::store::{self, Collection, DocumentStore, Filter};
use async_trait::async_trait;
use std::sync::Arc;

/// Sink for activity stream entries.
///
/// Recording never fails the operation that produced the entry; a failed
/// write is logged and dropped.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record(&self, entry: Activity);
}

#[derive(Clone)]
pub struct StoreActivityLog {
    store: Arc<dyn DocumentStore>,
}

impl StoreActivityLog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Entries about one object, oldest first.
    pub async fn for_object(&self, object_id: &str) -> InventoryResult<Vec<Activity>> {
        Ok(store::load_all(
            self.store.as_ref(),
            Collection::ActivityStream,
            &Filter::all().eq("object_id", object_id),
        )
        .await?)
    }
}

#[async_trait]
impl ActivityLog for StoreActivityLog {
    async fn record(&self, entry: Activity) {
        let document = match store::encode(&entry) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(object_id = %entry.object_id, error = %e, "Failed to encode activity entry");
                return;
            }
        };

        if let Err(e) = self.store.insert(Collection::ActivityStream, document).await {
            tracing::warn!(
                object_id = %entry.object_id,
                object_type = %entry.object_type,
                error = %e,
                "Failed to record activity"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::MemoryStore;

    #[tokio::test]
    async fn entries_are_listed_per_object() {
        let store = MemoryStore::new();
        let log = StoreActivityLog::new(Arc::new(store.clone()));

        log.record(Activity::new("credential", "c1", "alice", "created"))
            .await;
        log.record(Activity::new("credential", "c2", "alice", "created"))
            .await;
        log.record(Activity::new("credential", "c1", "bob", "updated"))
            .await;

        let entries = log.for_object("c1").await.unwrap();
        let descriptions: Vec<_> = entries.iter().map(|a| a.description.as_str()).collect();
        assert_eq!(descriptions, vec!["created", "updated"]);
    }

    #[tokio::test]
    async fn write_failures_are_swallowed() {
        let store = MemoryStore::new();
        store.fail_writes(Collection::ActivityStream);
        let log = StoreActivityLog::new(Arc::new(store.clone()));

        log.record(Activity::new("group", "g1", "alice", "deleted"))
            .await;

        assert_eq!(store.count(Collection::ActivityStream), 0);
    }
}
