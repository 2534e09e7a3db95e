//! Embedded vector index backed by the `ragdesk-vector` crate.
//!
//! One collection holds every chunk entry. The collection records the
//! embedding model that produced its vectors as the `embedding_model`
//! property so a restart with a different model is noticed.

use crate::types::{AppError, IndexEntry, IndexStats, Result, SearchResult};
use async_trait::async_trait;
use ragdesk_vector::{Config, Record, VectorDb};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::vectorstore::VectorIndex;

const EMBEDDING_MODEL_PROPERTY: &str = "embedding_model";

/// Vector index stored in an embedded `VectorDb`.
pub struct EmbeddedIndex {
    db: VectorDb,
    collection: String,
    embedding_model: String,
}

impl EmbeddedIndex {
    /// Open (or create) the index.
    ///
    /// # Arguments
    ///
    /// * `path` - Data directory. If None, operates in-memory.
    /// * `collection` - Collection holding the entries.
    /// * `embedding_model` - Model identifier recorded with the collection.
    pub async fn open(path: Option<String>, collection: &str, embedding_model: &str) -> Result<Self> {
        let config = match path {
            Some(ref p) => Config::persistent(PathBuf::from(p)),
            None => Config::memory(),
        };

        let db = VectorDb::open(config).await.map_err(|e| {
            AppError::Configuration(format!("Failed to open vector index: {}", e))
        })?;

        let col = db.get_or_create_collection(collection).await?;

        match col.property(EMBEDDING_MODEL_PROPERTY) {
            Some(stored) if stored != embedding_model => {
                warn!(
                    collection,
                    stored = %stored,
                    configured = embedding_model,
                    "Index was built with a different embedding model; clear and re-ingest to switch"
                );
            }
            Some(_) => {}
            None => {
                db.set_property(collection, EMBEDDING_MODEL_PROPERTY, embedding_model)
                    .await?;
            }
        }

        info!(
            collection,
            entries = col.len(),
            persistent = path.is_some(),
            "Vector index ready"
        );

        Ok(Self {
            db,
            collection: collection.to_string(),
            embedding_model: embedding_model.to_string(),
        })
    }

    /// In-memory index, mostly useful for tests.
    pub async fn in_memory(collection: &str, embedding_model: &str) -> Result<Self> {
        Self::open(None, collection, embedding_model).await
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl VectorIndex for EmbeddedIndex {
    fn provider_name(&self) -> &'static str {
        "ragdesk-vector"
    }

    async fn add(&self, entries: Vec<IndexEntry>) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let records: Vec<Record> = entries
            .into_iter()
            .map(|entry| Record::new(entry.id, entry.embedding, entry.text).with_metadata(entry.metadata))
            .collect();

        let added = self.db.insert_batch(&self.collection, records).await?;

        // clear() drops dimensions but keeps properties; re-stamp after a
        // model switch so stats report what the vectors were built with.
        let col = self.db.collection(&self.collection)?;
        if col.property(EMBEDDING_MODEL_PROPERTY).as_deref() != Some(self.embedding_model.as_str())
            && col.len() == added
        {
            self.db
                .set_property(&self.collection, EMBEDDING_MODEL_PROPERTY, &self.embedding_model)
                .await?;
        }

        debug!(added, "Added entries to index");
        Ok(added)
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let hits = self.db.search(&self.collection, embedding, k)?;

        Ok(hits
            .into_iter()
            .enumerate()
            .map(|(i, hit)| SearchResult {
                text: hit.document,
                metadata: hit.metadata,
                similarity_score: hit.score,
                rank: i + 1,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.db.count(&self.collection)?)
    }

    async fn clear(&self) -> Result<()> {
        self.db.clear(&self.collection).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats> {
        let stats = self.db.collection_stats(&self.collection)?;
        let embedding_model = stats
            .properties
            .get(EMBEDDING_MODEL_PROPERTY)
            .cloned()
            .unwrap_or_else(|| self.embedding_model.clone());

        Ok(IndexStats {
            total_entries: stats.vector_count,
            collection_name: stats.name,
            embedding_model,
            dimensions: stats.dimensions,
            provider: self.provider_name().to_string(),
        })
    }
}
