//! # MongoDB
//!
//! Document store access.
//!
//! The handle has exactly two states, decided once at startup: either both
//! `DATABASE_URL` and `DATABASE_NAME` were supplied and the server answered
//! a ping, or the process runs without a database for its whole lifetime.
//! A failed operation later on does not flip the state back; it is reported
//! per call and the read handlers decide whether to fall back.
//!
//! All collection access goes through this facade. Handlers never hold a
//! raw driver handle.

use futures::TryStreamExt;
use mongodb::{
    Client, Collection, IndexModel,
    bson::{Document, doc},
};
use tracing::{info, warn};

use crate::{config::Config, error::AppError};

pub const COL_METRIC: &str = "metric";
pub const COL_REEL: &str = "reel";
pub const COL_CONTACT: &str = "contactmessage";

/// Hard ceiling on any single read, regardless of the caller-requested limit.
pub const MAX_LIMIT: i64 = 50;

fn capped(limit: i64) -> i64 {
    limit.min(MAX_LIMIT)
}

pub enum Store {
    Unconfigured,
    Connected(mongodb::Database),
}

impl Store {
    /// Resolves the handle state from configuration. Missing connection
    /// parameters or an unreachable server both land in `Unconfigured`;
    /// the server still starts and serves fallback content.
    pub async fn connect(config: &Config) -> Self {
        let (Some(url), Some(name)) = (&config.database_url, &config.database_name) else {
            warn!("DATABASE_URL or DATABASE_NAME not set, running without a database");
            return Store::Unconfigured;
        };

        let client = match Client::with_uri_str(url).await {
            Ok(client) => client,
            Err(e) => {
                warn!("Invalid database configuration: {e}");
                return Store::Unconfigured;
            }
        };

        let database = client.database(name);
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => {
                info!("Connected to database {name}");
                Store::Connected(database)
            }
            Err(e) => {
                warn!("Database unreachable: {e}");
                Store::Unconfigured
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Store::Connected(_))
    }

    fn collection(&self, name: &str) -> Result<Collection<Document>, AppError> {
        match self {
            Store::Connected(database) => Ok(database.collection(name)),
            Store::Unconfigured => Err(AppError::StoreUnavailable),
        }
    }

    /// Inserts one document and returns its store-assigned id as an opaque
    /// string. Never retried; the caller decides what a failure means.
    pub async fn create_document(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<String, AppError> {
        let result = self.collection(collection)?.insert_one(document).await?;

        let id = result
            .inserted_id
            .as_object_id()
            .map(|oid| oid.to_hex())
            .unwrap_or_else(|| result.inserted_id.to_string());

        Ok(id)
    }

    /// Reads up to `limit` documents matching `filter`. A non-positive
    /// limit yields an empty result without touching the store; anything
    /// above [`MAX_LIMIT`] is silently capped. An empty collection is a
    /// legitimate empty result, not a failure.
    pub async fn get_documents(
        &self,
        collection: &str,
        filter: Document,
        limit: i64,
    ) -> Result<Vec<Document>, AppError> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let cursor = self
            .collection(collection)?
            .find(filter)
            .limit(capped(limit))
            .await?;

        Ok(cursor.try_collect().await?)
    }

    /// Idempotent index creation, used by startup seeding.
    pub async fn create_index(&self, collection: &str, keys: Document) -> Result<(), AppError> {
        self.collection(collection)?
            .create_index(IndexModel::builder().keys(keys).build())
            .await?;

        Ok(())
    }

    /// Collection names for the diagnostics endpoint.
    pub async fn collection_names(&self) -> Result<Vec<String>, AppError> {
        match self {
            Store::Connected(database) => Ok(database.list_collection_names().await?),
            Store::Unconfigured => Err(AppError::StoreUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;

    use super::{COL_CONTACT, COL_METRIC, MAX_LIMIT, Store, capped};
    use crate::error::AppError;

    #[test]
    fn test_limit_cap() {
        assert_eq!(capped(1000), MAX_LIMIT);
        assert_eq!(capped(MAX_LIMIT), MAX_LIMIT);
        assert_eq!(capped(20), 20);
    }

    #[test]
    fn test_unconfigured_reports_state() {
        assert!(!Store::Unconfigured.is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_create_fails() {
        let err = Store::Unconfigured
            .create_document(COL_CONTACT, doc! { "name": "Song" })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StoreUnavailable));
    }

    #[tokio::test]
    async fn test_unconfigured_get_fails() {
        let err = Store::Unconfigured
            .get_documents(COL_METRIC, doc! {}, 10)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StoreUnavailable));
    }

    #[tokio::test]
    async fn test_non_positive_limit_is_empty_not_an_error() {
        for limit in [0, -1, -50] {
            let docs = Store::Unconfigured
                .get_documents(COL_METRIC, doc! {}, limit)
                .await
                .unwrap();
            assert!(docs.is_empty());
        }
    }
}
