use super::{document_id, Collection, DocumentStore, Filter, StoreError};
use async_trait::async_trait;
use mongodb::bson::Document;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

type Collections = HashMap<Collection, BTreeMap<String, Document>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteFailure {
    Unavailable,
    Duplicate,
}

/// In-process store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<Collections>>,
    failing: Arc<Mutex<HashMap<Collection, WriteFailure>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `collection` fail until [`MemoryStore::heal`] is called.
    pub fn fail_writes(&self, collection: Collection) {
        self.inject(collection, WriteFailure::Unavailable);
    }

    /// Reject inserts and replacements in `collection` the way a unique index
    /// does when a concurrent writer got there first.
    pub fn reject_as_duplicate(&self, collection: Collection) {
        self.inject(collection, WriteFailure::Duplicate);
    }

    pub fn heal(&self) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.clear();
        }
    }

    pub fn count(&self, collection: Collection) -> usize {
        self.collections
            .lock()
            .map(|c| c.get(&collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    fn inject(&self, collection: Collection, failure: WriteFailure) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(collection, failure);
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, StoreError> {
        self.collections
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))
    }

    /// `key` is set for writes that a unique index could reject.
    fn check_writable(&self, collection: Collection, key: Option<&str>) -> Result<(), StoreError> {
        let failing = self
            .failing
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))?;
        match (failing.get(&collection), key) {
            (Some(WriteFailure::Unavailable), _) => Err(StoreError::Unavailable(format!(
                "writes to {} are failing",
                collection.name()
            ))),
            (Some(WriteFailure::Duplicate), Some(key)) => Err(StoreError::Duplicate {
                collection: collection.name(),
                key: key.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.lock()?;
        Ok(collections
            .get(&collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.lock()?;
        Ok(collections
            .get(&collection)
            .map(|documents| {
                documents
                    .values()
                    .filter(|d| filter.matches(d))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, collection: Collection, document: Document) -> Result<(), StoreError> {
        let id = document_id(collection, &document)?;
        self.check_writable(collection, Some(id.as_str()))?;
        let mut collections = self.lock()?;
        let documents = collections.entry(collection).or_default();
        if documents.contains_key(&id) {
            return Err(StoreError::Duplicate {
                collection: collection.name(),
                key: id,
            });
        }
        documents.insert(id, document);
        Ok(())
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> Result<bool, StoreError> {
        self.check_writable(collection, Some(id))?;
        let mut collections = self.lock()?;
        match collections
            .get_mut(&collection)
            .and_then(|documents| documents.get_mut(id))
        {
            Some(existing) => {
                *existing = document;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_by_id(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        self.check_writable(collection, None)?;
        let mut collections = self.lock()?;
        Ok(collections
            .get_mut(&collection)
            .and_then(|documents| documents.remove(id))
            .is_some())
    }

    async fn remove_all(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        self.check_writable(collection, None)?;
        let mut collections = self.lock()?;
        let Some(documents) = collections.get_mut(&collection) else {
            return Ok(0);
        };
        let before = documents.len();
        documents.retain(|_, d| !filter.matches(d));
        Ok((before - documents.len()) as u64)
    }
}
