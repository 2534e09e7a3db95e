//! # ragdesk-vector
//!
//! An embedded, exact nearest-neighbour vector store with optional JSON
//! persistence. Each collection stores records of `(id, vector, document,
//! metadata)` and answers top-k cosine similarity queries by scoring every
//! record.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ragdesk_vector::{Config, Record, VectorDb};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ragdesk_vector::Error> {
//!     let db = VectorDb::open(Config::persistent("./data/vectors")).await?;
//!     db.get_or_create_collection("documents").await?;
//!
//!     db.insert_batch("documents", vec![Record::new("doc_0_chunk_0", vec![0.1; 384], "text")])
//!         .await?;
//!
//!     let results = db.search("documents", &[0.1; 384], 5)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Consistency
//!
//! Writes are serialized per database. A write is applied to a copy of the
//! collection, flushed to disk in persistent mode, and only then published
//! to readers under a single lock. Readers never observe a partially applied
//! or failed write, and a failed flush leaves both memory and disk as they
//! were.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod config;
pub mod error;
pub mod index;
pub mod persistence;
pub mod types;

pub use collection::{Collection, CollectionState};
pub use config::Config;
pub use error::{Error, Result};
pub use types::{MetadataValue, Record, SearchResult, VectorId, VectorMetadata};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// The main vector database instance.
///
/// Cheap to clone; clones share the same collections.
#[derive(Clone)]
pub struct VectorDb {
    inner: Arc<VectorDbInner>,
}

struct VectorDbInner {
    config: Config,
    collections: parking_lot::RwLock<HashMap<String, Arc<Collection>>>,
    /// Serializes mutations and their flush to disk.
    write_lock: tokio::sync::Mutex<()>,
}

impl VectorDb {
    /// Open or create a vector database with the given configuration.
    ///
    /// # Errors
    ///
    /// In persistent mode, every collection listed on disk must load. A
    /// collection that cannot be read fails the open rather than being
    /// dropped, so its files are never replaced by an empty collection.
    #[instrument(skip(config), fields(persistent = config.is_persistent()))]
    pub async fn open(config: Config) -> Result<Self> {
        info!("Opening vector database");

        let db = Self {
            inner: Arc::new(VectorDbInner {
                config,
                collections: parking_lot::RwLock::new(HashMap::new()),
                write_lock: tokio::sync::Mutex::new(()),
            }),
        };

        db.load_collections().await?;
        Ok(db)
    }

    /// The configuration this database was opened with.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Create a new, empty collection.
    ///
    /// # Errors
    ///
    /// Returns an error if a collection with the same name already exists.
    #[instrument(skip(self))]
    pub async fn create_collection(&self, name: &str) -> Result<Arc<Collection>> {
        let _guard = self.inner.write_lock.lock().await;
        if self.collection_exists(name) {
            return Err(Error::CollectionExists(name.to_string()));
        }
        info!(name, "Creating collection");

        let collection = Arc::new(Collection::new(name));
        if let Some(ref path) = self.inner.config.data_path {
            persistence::save_collection(path, name, &collection.stage()).await?;
            let mut names = self.list_collections();
            names.push(name.to_string());
            names.sort();
            persistence::save_collection_names(path, &names).await?;
        }

        self.inner
            .collections
            .write()
            .insert(name.to_string(), collection.clone());
        Ok(collection)
    }

    /// Return the named collection, creating it if needed.
    pub async fn get_or_create_collection(&self, name: &str) -> Result<Arc<Collection>> {
        if let Ok(existing) = self.collection(name) {
            return Ok(existing);
        }
        match self.create_collection(name).await {
            Err(Error::CollectionExists(_)) => self.collection(name),
            other => other,
        }
    }

    /// Check if a collection exists.
    pub fn collection_exists(&self, name: &str) -> bool {
        self.inner.collections.read().contains_key(name)
    }

    /// List all collection names, sorted.
    pub fn list_collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Get a handle to a collection.
    pub fn collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.inner
            .collections
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    /// Insert a batch of records atomically and flush.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn insert_batch(&self, collection: &str, records: Vec<Record>) -> Result<usize> {
        let count = self
            .apply(collection, |state| state.index.insert_batch(records))
            .await?;
        debug!(count, "Inserted batch");
        Ok(count)
    }

    /// Search for similar vectors, best first.
    #[instrument(skip(self, query), fields(dim = query.len()))]
    pub fn search(&self, collection: &str, query: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let col = self.collection(collection)?;
        let results = col.search(query, limit)?;
        debug!(count = results.len(), "Search completed");
        Ok(results)
    }

    /// Get the number of records in a collection.
    pub fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.collection(collection)?.len())
    }

    /// Remove every record from a collection and flush. Properties are kept.
    #[instrument(skip(self))]
    pub async fn clear(&self, collection: &str) -> Result<()> {
        self.apply(collection, |state| {
            state.index.clear();
            Ok(())
        })
        .await?;
        info!(collection, "Cleared collection");
        Ok(())
    }

    /// Set a collection property and flush.
    pub async fn set_property(&self, collection: &str, key: &str, value: &str) -> Result<()> {
        self.apply(collection, |state| {
            state.properties.insert(key.to_string(), value.to_string());
            Ok(())
        })
        .await
    }

    /// Get collection statistics.
    pub fn collection_stats(&self, collection: &str) -> Result<CollectionStats> {
        Ok(self.collection(collection)?.stats())
    }

    /// Run one write: change a staged copy, flush it, then publish it.
    async fn apply<T>(
        &self,
        collection: &str,
        change: impl FnOnce(&mut CollectionState) -> Result<T>,
    ) -> Result<T> {
        let _guard = self.inner.write_lock.lock().await;
        let col = self.collection(collection)?;

        let mut next = col.stage();
        let value = change(&mut next)?;

        if let Some(ref path) = self.inner.config.data_path {
            if let Err(e) = persistence::save_collection(path, col.name(), &next).await {
                warn!(collection, error = %e, "Flush failed, keeping previous state");
                return Err(e);
            }
        }

        col.commit(next);
        Ok(value)
    }

    async fn load_collections(&self) -> Result<()> {
        let Some(ref path) = self.inner.config.data_path else {
            return Ok(());
        };

        if !tokio::fs::try_exists(path).await? {
            tokio::fs::create_dir_all(path).await?;
            return Ok(());
        }

        for name in persistence::load_collection_names(path).await? {
            let collection = persistence::load_collection(path, &name)
                .await
                .map_err(|e| {
                    Error::Persistence(format!("Failed to load collection '{}': {}", name, e))
                })?;
            self.inner
                .collections
                .write()
                .insert(name, Arc::new(collection));
        }

        Ok(())
    }
}

impl std::fmt::Debug for VectorDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorDb")
            .field("config", &self.inner.config)
            .field("collections", &self.list_collections())
            .finish()
    }
}

/// Statistics about a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Name of the collection.
    pub name: String,
    /// Number of vectors in the collection.
    pub vector_count: usize,
    /// Dimensionality of vectors, once established.
    pub dimensions: Option<usize>,
    /// Approximate memory usage in bytes.
    pub memory_bytes: usize,
    /// Collection-level properties.
    pub properties: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn records() -> Vec<Record> {
        vec![
            Record::new("vec1", vec![1.0, 0.0, 0.0], "one"),
            Record::new("vec2", vec![0.0, 1.0, 0.0], "two"),
            Record::new("vec3", vec![0.9, 0.1, 0.0], "three"),
        ]
    }

    /// Put a directory where the collection's temporary file goes, so every
    /// later flush of that collection fails.
    async fn block_flushes(base: &Path, collection: &str) {
        let tmp = base.join(collection).join("collection.json.tmp");
        tokio::fs::create_dir_all(tmp).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_and_search() {
        let db = VectorDb::open(Config::memory()).await.unwrap();
        db.create_collection("test").await.unwrap();
        db.insert_batch("test", records()).await.unwrap();

        let results = db.search("test", &[1.0, 0.0, 0.0], 10).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, "vec1");
        assert_eq!(results[1].id, "vec3");
    }

    #[tokio::test]
    async fn test_duplicate_collection_error() {
        let db = VectorDb::open(Config::memory()).await.unwrap();
        db.create_collection("test").await.unwrap();
        assert!(db.collection_exists("test"));

        let result = db.create_collection("test").await;
        assert!(matches!(result, Err(Error::CollectionExists(_))));

        let existing = db.get_or_create_collection("test").await.unwrap();
        assert_eq!(existing.name(), "test");
    }

    #[tokio::test]
    async fn test_clear_then_reinsert_new_dimension() {
        let db = VectorDb::open(Config::memory()).await.unwrap();
        db.create_collection("test").await.unwrap();
        db.insert_batch("test", records()).await.unwrap();

        db.clear("test").await.unwrap();
        assert_eq!(db.count("test").unwrap(), 0);

        db.insert_batch("test", vec![Record::new("a", vec![1.0, 0.0], "a")])
            .await
            .unwrap();
        assert_eq!(db.collection_stats("test").unwrap().dimensions, Some(2));
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let temp_dir = TempDir::new().unwrap();

        {
            let db = VectorDb::open(Config::persistent(temp_dir.path())).await.unwrap();
            db.create_collection("documents").await.unwrap();
            db.set_property("documents", "embedding_model", "mini")
                .await
                .unwrap();
            db.insert_batch("documents", records()).await.unwrap();
        }

        let db = VectorDb::open(Config::persistent(temp_dir.path())).await.unwrap();
        assert_eq!(db.list_collections(), vec!["documents"]);
        assert_eq!(db.count("documents").unwrap(), 3);

        let stats = db.collection_stats("documents").unwrap();
        assert_eq!(stats.properties.get("embedding_model").map(String::as_str), Some("mini"));

        let results = db.search("documents", &[0.0, 1.0, 0.0], 1).unwrap();
        assert_eq!(results[0].id, "vec2");
        assert_eq!(results[0].document, "two");
    }

    #[tokio::test]
    async fn test_rejected_batch_leaves_store_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let db = VectorDb::open(Config::persistent(temp_dir.path())).await.unwrap();
        db.create_collection("documents").await.unwrap();
        db.insert_batch("documents", records()).await.unwrap();

        let result = db
            .insert_batch(
                "documents",
                vec![
                    Record::new("new", vec![0.0, 0.0, 1.0], "new"),
                    Record::new("vec1", vec![1.0, 1.0, 1.0], "dup"),
                ],
            )
            .await;
        assert!(matches!(result, Err(Error::DuplicateId(_))));
        assert_eq!(db.count("documents").unwrap(), 3);

        let reopened = VectorDb::open(Config::persistent(temp_dir.path())).await.unwrap();
        assert_eq!(reopened.count("documents").unwrap(), 3);
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_committed_entries() {
        let temp_dir = TempDir::new().unwrap();
        let db = VectorDb::open(Config::persistent(temp_dir.path())).await.unwrap();
        db.create_collection("documents").await.unwrap();
        db.set_property("documents", "embedding_model", "mini")
            .await
            .unwrap();
        db.insert_batch("documents", vec![Record::new("a", vec![1.0, 0.0], "alpha")])
            .await
            .unwrap();

        block_flushes(temp_dir.path(), "documents").await;

        let result = db
            .insert_batch("documents", vec![Record::new("b", vec![0.0, 1.0], "beta")])
            .await;
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(db.clear("documents").await.is_err());
        assert!(db.set_property("documents", "embedding_model", "other").await.is_err());

        let col = db.collection("documents").unwrap();
        assert_eq!(col.len(), 1);
        assert!(col.contains("a"));
        assert!(!col.contains("b"));
        assert_eq!(col.property("embedding_model").as_deref(), Some("mini"));

        let reopened = VectorDb::open(Config::persistent(temp_dir.path())).await.unwrap();
        assert_eq!(reopened.list_collections(), vec!["documents"]);
        assert_eq!(reopened.count("documents").unwrap(), 1);
        let hits = reopened.search("documents", &[1.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].id, "a");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_readers_never_see_failed_writes() {
        let temp_dir = TempDir::new().unwrap();
        let db = VectorDb::open(Config::persistent(temp_dir.path())).await.unwrap();
        db.create_collection("documents").await.unwrap();
        db.insert_batch("documents", vec![Record::new("a", vec![1.0, 0.0], "alpha")])
            .await
            .unwrap();
        block_flushes(temp_dir.path(), "documents").await;

        let reader = {
            let db = db.clone();
            tokio::spawn(async move {
                for _ in 0..500 {
                    assert_eq!(db.count("documents").unwrap(), 1);
                    let hits = db.search("documents", &[0.0, 1.0], 5).unwrap();
                    assert_eq!(hits.len(), 1);
                    tokio::task::yield_now().await;
                }
            })
        };

        for i in 0..50 {
            let id = format!("b{}", i);
            assert!(db
                .insert_batch("documents", vec![Record::new(id, vec![0.0, 1.0], "beta")])
                .await
                .is_err());
            assert!(db.clear("documents").await.is_err());
        }

        reader.await.unwrap();
        assert_eq!(db.count("documents").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_open_fails_on_unreadable_collection() {
        let temp_dir = TempDir::new().unwrap();
        {
            let db = VectorDb::open(Config::persistent(temp_dir.path())).await.unwrap();
            db.create_collection("documents").await.unwrap();
            db.insert_batch("documents", records()).await.unwrap();
        }

        let file = temp_dir.path().join("documents").join("collection.json");
        tokio::fs::write(&file, "{truncated").await.unwrap();

        let err = VectorDb::open(Config::persistent(temp_dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
        // The damaged file is left for inspection, not overwritten.
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "{truncated");
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let db = VectorDb::open(Config::memory()).await.unwrap();
        assert!(matches!(
            db.search("nope", &[1.0], 1),
            Err(Error::CollectionNotFound(_))
        ));
    }
}
