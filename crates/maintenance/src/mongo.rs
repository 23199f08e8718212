use crate::error::StoreError;
use crate::store::DocumentStore;
use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Database};
use tracing::debug;

pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Parses `uri` and prepares a client. No round trip happens until the
    /// first operation, so call [`DocumentStore::ping`] to verify the server.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(database);
        Ok(Self { client, db })
    }

    pub fn database_name(&self) -> &str {
        self.db.name()
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        debug!("MongoDB ping ok");
        Ok(())
    }

    async fn collection_names(&self) -> Result<Vec<String>, StoreError> {
        let mut names = self.db.list_collection_names().await?;
        names.sort();
        Ok(names)
    }

    async fn count_documents(&self, collection: &str) -> Result<u64, StoreError> {
        let count = self
            .db
            .collection::<Document>(collection)
            .count_documents(doc! {})
            .await?;
        Ok(count)
    }

    async fn delete_all(&self, collection: &str) -> Result<u64, StoreError> {
        let result = self
            .db
            .collection::<Document>(collection)
            .delete_many(doc! {})
            .await?;
        Ok(result.deleted_count)
    }
}
