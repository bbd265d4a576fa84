use futures::TryStreamExt;
use mongodb::bson::Document;
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::{Client, Database};
use serde::de::DeserializeOwned;

use crate::config::AppConfig;
use crate::core::errors::StoreError;

/// Read access to the document store, one named collection at a time.
///
/// Implementations are shared by every request and must not hold
/// per-request state.
#[allow(async_fn_in_trait)]
pub trait Store {
    async fn count(&self, collection: &str, filter: Document) -> Result<u64, StoreError>;

    async fn find<T>(
        &self,
        collection: &str,
        filter: Document,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned + Send + Sync + Unpin;
}

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let client = Client::with_uri_str(config.mongo_uri()).await?;
        Ok(Self::new(client.database(&config.mongo_database)))
    }

    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn classify(err: MongoError) -> StoreError {
    match *err.kind {
        ErrorKind::Command(ref cmd) => StoreError::Query(format!("{} ({})", cmd.message, cmd.code_name)),
        ErrorKind::BsonDeserialization(ref e) => StoreError::Decode(e.to_string()),
        _ => StoreError::Unavailable(err.to_string()),
    }
}

impl Store for MongoStore {
    async fn count(&self, collection: &str, filter: Document) -> Result<u64, StoreError> {
        self.db
            .collection::<Document>(collection)
            .count_documents(filter)
            .await
            .map_err(classify)
    }

    async fn find<T>(
        &self,
        collection: &str,
        filter: Document,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned + Send + Sync + Unpin,
    {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        // The server reads skip as a signed 64-bit integer
        let skip = skip.min(i64::MAX as u64);
        let cursor = self
            .db
            .collection::<T>(collection)
            .find(filter)
            .skip(skip)
            .limit(limit)
            .await
            .map_err(classify)?;

        cursor.try_collect().await.map_err(classify)
    }
}
