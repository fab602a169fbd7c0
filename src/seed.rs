//! # Seeding
//!
//! The canonical default content: one metric snapshot and two reels.
//!
//! These records serve two jobs. At startup they are persisted into empty
//! collections so a fresh database has something to show. At request time
//! they are the fallback catalog returned whenever the store is absent or a
//! read fails, so the public site keeps rendering. Fallback records are
//! never persisted by the read path and are structurally identical on every
//! call.

use std::sync::LazyLock;

use chrono::Utc;
use mongodb::bson::{Document, doc, to_document};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    error::AppError,
    models::{Metric, Reel},
    store::{COL_CONTACT, COL_METRIC, COL_REEL, Store},
};

// Built once per process so repeated fallback responses compare equal,
// timestamps included.
static SEED_METRICS: LazyLock<Vec<Metric>> = LazyLock::new(|| {
    vec![Metric {
        platform: "Instagram".to_string(),
        followers: 1_250_000,
        avg_views: 1_500_000,
        engagement_rate: 8.7,
        last_updated: Utc::now(),
    }]
});

static SEED_REELS: LazyLock<Vec<Reel>> = LazyLock::new(|| {
    vec![
        Reel {
            id: None,
            title: "Pad work with a twist".to_string(),
            thumbnail_url:
                "https://images.unsplash.com/photo-1605296867304-46d5465a13f1?q=80&w=1200&auto=format&fit=crop"
                    .to_string(),
            video_url: Some("https://www.example.com/reel1.mp4".to_string()),
            views: 2_300_000,
            likes: 340_000,
            hashtags: vec![
                "#muaythai".to_string(),
                "#twerk".to_string(),
                "#funnytraining".to_string(),
            ],
            posted_at: Utc::now(),
        },
        Reel {
            id: None,
            title: "Elbows, knees & giggles".to_string(),
            thumbnail_url:
                "https://images.unsplash.com/photo-1544916601-0aa3f82a1f2d?q=80&w=1200&auto=format&fit=crop"
                    .to_string(),
            video_url: Some("https://www.example.com/reel2.mp4".to_string()),
            views: 1_800_000,
            likes: 280_000,
            hashtags: vec![
                "#muaythai".to_string(),
                "#reels".to_string(),
                "#songpengsawang".to_string(),
            ],
            posted_at: Utc::now(),
        },
    ]
});

pub fn seed_metrics() -> Vec<Metric> {
    SEED_METRICS.clone()
}

pub fn seed_reels() -> Vec<Reel> {
    SEED_REELS.clone()
}

/// The facade operations bootstrap needs, separated so the seed-once
/// decision can be exercised against an in-memory stand-in instead of a
/// running database.
trait SeedStore {
    fn is_configured(&self) -> bool;
    async fn ensure_index(&self, collection: &str, keys: Document) -> Result<(), AppError>;
    async fn has_documents(&self, collection: &str) -> Result<bool, AppError>;
    async fn insert(&self, collection: &str, document: Document) -> Result<String, AppError>;
}

impl SeedStore for Store {
    fn is_configured(&self) -> bool {
        Store::is_configured(self)
    }

    async fn ensure_index(&self, collection: &str, keys: Document) -> Result<(), AppError> {
        self.create_index(collection, keys).await
    }

    async fn has_documents(&self, collection: &str) -> Result<bool, AppError> {
        let existing = self.get_documents(collection, doc! {}, 1).await?;
        Ok(!existing.is_empty())
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<String, AppError> {
        self.create_document(collection, document).await
    }
}

/// One-time startup bootstrap: indexes, then default content for empty
/// collections. Every step tolerates failure on its own; a database that is
/// down must never stop the server from coming up.
pub async fn run(store: &Store) {
    bootstrap(store).await;
}

async fn bootstrap<S: SeedStore>(store: &S) {
    if !store.is_configured() {
        info!("No database configured, skipping bootstrap seeding");
        return;
    }

    ensure_indexes(store).await;
    seed_collection(store, COL_METRIC, &seed_metrics()).await;
    seed_collection(store, COL_REEL, &seed_reels()).await;
}

async fn ensure_indexes<S: SeedStore>(store: &S) {
    let specs = [
        (COL_REEL, doc! { "posted_at": -1 }),
        (COL_REEL, doc! { "views": -1 }),
        (COL_CONTACT, doc! { "email": 1 }),
    ];

    for (collection, keys) in specs {
        if let Err(e) = store.ensure_index(collection, keys).await {
            warn!("Failed to create index on {collection}: {e}");
        }
    }
}

/// Inserts `records` only when `collection` is currently empty. The
/// empty-check and inserts are not atomic across processes; a duplicate
/// seed under concurrent cold starts is accepted for display-only content.
async fn seed_collection<S: SeedStore, T: Serialize>(store: &S, collection: &str, records: &[T]) {
    let occupied = match store.has_documents(collection).await {
        Ok(occupied) => occupied,
        Err(e) => {
            warn!("Skipping seed for {collection}, empty-check failed: {e}");
            return;
        }
    };

    if occupied {
        return;
    }

    let mut inserted = 0;
    for record in records {
        let document = match to_document(record) {
            Ok(document) => document,
            Err(e) => {
                warn!("Failed to encode seed record for {collection}: {e}");
                continue;
            }
        };

        match store.insert(collection, document).await {
            Ok(_) => inserted += 1,
            Err(e) => warn!("Failed to insert seed record into {collection}: {e}"),
        }
    }

    info!("Seeded {inserted} default documents into {collection}");
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use mongodb::bson::{Document, doc};

    use super::{SeedStore, bootstrap, run, seed_metrics, seed_reels};
    use crate::{
        error::AppError,
        store::{COL_METRIC, COL_REEL, Store},
    };

    #[derive(Default)]
    struct FakeStore {
        collections: Mutex<HashMap<String, Vec<Document>>>,
    }

    impl FakeStore {
        fn count(&self, collection: &str) -> usize {
            self.collections
                .lock()
                .unwrap()
                .get(collection)
                .map_or(0, Vec::len)
        }
    }

    impl SeedStore for FakeStore {
        fn is_configured(&self) -> bool {
            true
        }

        async fn ensure_index(&self, _collection: &str, _keys: Document) -> Result<(), AppError> {
            Ok(())
        }

        async fn has_documents(&self, collection: &str) -> Result<bool, AppError> {
            Ok(self.count(collection) > 0)
        }

        async fn insert(&self, collection: &str, document: Document) -> Result<String, AppError> {
            let mut collections = self.collections.lock().unwrap();
            let documents = collections.entry(collection.to_string()).or_default();
            documents.push(document);
            Ok(documents.len().to_string())
        }
    }

    #[test]
    fn test_seed_metric_values() {
        let metrics = seed_metrics();

        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].platform, "Instagram");
        assert_eq!(metrics[0].followers, 1_250_000);
        assert_eq!(metrics[0].avg_views, 1_500_000);
        assert_eq!(metrics[0].engagement_rate, 8.7);
    }

    #[test]
    fn test_seed_reel_values() {
        let reels = seed_reels();

        assert_eq!(reels.len(), 2);
        assert_eq!(reels[0].title, "Pad work with a twist");
        assert_eq!(reels[1].title, "Elbows, knees & giggles");
        assert!(reels.iter().all(|r| r.id.is_none()));
    }

    #[test]
    fn test_catalog_is_stable_across_calls() {
        assert_eq!(seed_metrics(), seed_metrics());
        assert_eq!(seed_reels(), seed_reels());
    }

    #[test]
    fn test_catalog_records_pass_validation() {
        for metric in seed_metrics() {
            metric.validate().unwrap();
        }
        for reel in seed_reels() {
            reel.validate().unwrap();
        }
    }

    #[tokio::test]
    async fn test_run_tolerates_unconfigured_store() {
        run(&Store::Unconfigured).await;
        run(&Store::Unconfigured).await;
    }

    #[tokio::test]
    async fn test_seeding_twice_does_not_duplicate() {
        let store = FakeStore::default();

        bootstrap(&store).await;
        assert_eq!(store.count(COL_METRIC), 1);
        assert_eq!(store.count(COL_REEL), 2);

        bootstrap(&store).await;
        assert_eq!(store.count(COL_METRIC), 1);
        assert_eq!(store.count(COL_REEL), 2);
    }

    #[tokio::test]
    async fn test_seed_skips_occupied_collection() {
        let store = FakeStore::default();
        store
            .insert(COL_METRIC, doc! { "platform": "TikTok" })
            .await
            .unwrap();

        bootstrap(&store).await;

        assert_eq!(store.count(COL_METRIC), 1);
        assert_eq!(store.count(COL_REEL), 2);
    }
}
