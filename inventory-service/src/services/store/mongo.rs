use super::{document_id, Collection, DocumentStore, Filter, StoreError};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Database, IndexModel,
};

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            StoreError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), StoreError> {
        tracing::info!("Creating MongoDB indexes for inventory-service");

        let indexes = [
            (
                Collection::Groups,
                doc! { "inventory_id": 1, "name": 1 },
                "group_name_per_inventory",
                true,
            ),
            (
                Collection::Groups,
                doc! { "parent_group_id": 1 },
                "group_parent_lookup",
                false,
            ),
            (
                Collection::Hosts,
                doc! { "inventory_id": 1, "name": 1 },
                "host_name_per_inventory",
                true,
            ),
            (
                Collection::Hosts,
                doc! { "group_id": 1 },
                "host_group_lookup",
                false,
            ),
            (
                Collection::ActivityStream,
                doc! { "object_id": 1 },
                "activity_object_lookup",
                false,
            ),
            (
                Collection::Teams,
                doc! { "members": 1 },
                "team_member_lookup",
                false,
            ),
        ];

        for (collection, keys, name, unique) in indexes {
            let index = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(name.to_string())
                        .unique(unique)
                        .build(),
                )
                .build();

            self.collection(collection)
                .create_index(index, None)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to create {} index on {} collection: {}",
                        name,
                        collection.name(),
                        e
                    );
                    StoreError::from(e)
                })?;
            tracing::info!(index = name, collection = collection.name(), "Created index");
        }

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                StoreError::from(e)
            })?;
        Ok(())
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.db.collection(collection.name())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY_CODE
    )
}

fn map_write_error(collection: Collection, key: &str, err: mongodb::error::Error) -> StoreError {
    if is_duplicate_key(&err) {
        StoreError::Duplicate {
            collection: collection.name(),
            key: key.to_string(),
        }
    } else {
        StoreError::from(err)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.health_check().await
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collection(collection)
            .find_one(doc! { "_id": id }, None)
            .await?)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let cursor = self
            .collection(collection)
            .find(filter.to_document(), options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert(&self, collection: Collection, document: Document) -> Result<(), StoreError> {
        let id = document_id(collection, &document)?;
        self.collection(collection)
            .insert_one(document, None)
            .await
            .map_err(|e| map_write_error(collection, &id, e))?;
        Ok(())
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> Result<bool, StoreError> {
        let result = self
            .collection(collection)
            .replace_one(doc! { "_id": id }, document, None)
            .await
            .map_err(|e| map_write_error(collection, id, e))?;
        Ok(result.matched_count > 0)
    }

    async fn remove_by_id(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn remove_all(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        let result = self
            .collection(collection)
            .delete_many(filter.to_document(), None)
            .await?;
        Ok(result.deleted_count)
    }
}
