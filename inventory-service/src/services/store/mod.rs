//! Document persistence behind a small async trait.
//!
//! Services address documents by collection and string id and never see the
//! driver. [`MongoStore`] is the production backend; [`MemoryStore`] keeps
//! everything in process for tests and local runs.

mod filter;
mod memory;
mod mongo;

pub use filter::Filter;
pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::{self, Document};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Credentials,
    Groups,
    Hosts,
    Inventories,
    Teams,
    ActivityStream,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Credentials => "credentials",
            Collection::Groups => "groups",
            Collection::Hosts => "hosts",
            Collection::Inventories => "inventories",
            Collection::Teams => "teams",
            Collection::ActivityStream => "activity_stream",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("duplicate key in {collection}: {key}")]
    Duplicate { collection: &'static str, key: String },

    #[error("document in {0} has no string _id")]
    MissingId(&'static str),

    #[error("failed to encode document: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("failed to decode document: {0}")]
    Decode(#[from] bson::de::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Linearizable keyed document storage.
///
/// `update_by_id` replaces the whole document and reports whether it existed.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Matching documents in ascending id order.
    async fn find(&self, collection: Collection, filter: &Filter)
        -> Result<Vec<Document>, StoreError>;

    async fn insert(&self, collection: Collection, document: Document) -> Result<(), StoreError>;

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> Result<bool, StoreError>;

    async fn remove_by_id(&self, collection: Collection, id: &str) -> Result<bool, StoreError>;

    async fn remove_all(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError>;
}

/// Current time at the millisecond precision BSON dates keep.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Fresh document id. ObjectId hex keeps ids ordered by creation time.
pub fn new_id() -> String {
    bson::oid::ObjectId::new().to_hex()
}

pub fn encode<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    Ok(bson::to_document(value)?)
}

pub fn decode<T: DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    Ok(bson::from_document(document)?)
}

pub async fn load<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    id: &str,
) -> Result<Option<T>, StoreError> {
    store.find_by_id(collection, id).await?.map(decode).transpose()
}

pub async fn load_all<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    filter: &Filter,
) -> Result<Vec<T>, StoreError> {
    store
        .find(collection, filter)
        .await?
        .into_iter()
        .map(decode)
        .collect()
}

pub async fn exists(
    store: &dyn DocumentStore,
    collection: Collection,
    id: &str,
) -> Result<bool, StoreError> {
    Ok(store.find_by_id(collection, id).await?.is_some())
}

pub(crate) fn document_id(
    collection: Collection,
    document: &Document,
) -> Result<String, StoreError> {
    document
        .get_str("_id")
        .map(str::to_string)
        .map_err(|_| StoreError::MissingId(collection.name()))
}
