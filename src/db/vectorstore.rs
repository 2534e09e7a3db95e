//! Vector Index Abstraction
//!
//! The retrieval pipeline talks to its vector storage only through the
//! [`VectorIndex`] trait: add a batch of entries, query by embedding, count,
//! clear. Backends are selected at configuration time through
//! [`VectorIndexProvider`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ragdesk::db::vectorstore::{VectorIndex, VectorIndexProvider};
//!
//! let index = VectorIndexProvider::Embedded {
//!     path: Some("./data/vectors".into()),
//!     collection: "documents".into(),
//!     embedding_model: "all-MiniLM-L6-v2".into(),
//! }
//! .create_index()
//! .await?;
//!
//! index.add(entries).await?;
//! let results = index.query(&query_embedding, 5).await?;
//! ```

use crate::types::{IndexEntry, IndexStats, Result, SearchResult};
use crate::utils::toml_config::RagdeskConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Vector Index Provider Configuration
// ============================================================================

/// Configuration for vector index backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum VectorIndexProvider {
    /// Embedded exact-search store from the `ragdesk-vector` crate.
    ///
    /// Data is kept in memory and, when `path` is set, flushed to disk after
    /// every write.
    Embedded {
        /// Data directory (None for in-memory).
        path: Option<String>,
        /// Collection holding the chunk entries.
        collection: String,
        /// Identifier of the model that produced the stored embeddings.
        embedding_model: String,
    },
}

impl VectorIndexProvider {
    /// Build the provider from the `[index]` and `[embeddings]` sections.
    pub fn from_config(config: &RagdeskConfig) -> Self {
        VectorIndexProvider::Embedded {
            path: config.index.persist_directory.clone(),
            collection: config.index.collection.clone(),
            embedding_model: config.embeddings.model.clone(),
        }
    }

    /// Create a vector index instance from this provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if persisted data cannot be loaded.
    pub async fn create_index(&self) -> Result<Arc<dyn VectorIndex>> {
        match self {
            VectorIndexProvider::Embedded {
                path,
                collection,
                embedding_model,
            } => {
                let index =
                    super::ragdesk_vector::EmbeddedIndex::open(path.clone(), collection, embedding_model)
                        .await?;
                Ok(Arc::new(index))
            }
        }
    }
}

// ============================================================================
// Vector Index Trait
// ============================================================================

/// Nearest-neighbour store for chunk embeddings.
///
/// Implementations must allow concurrent `query` calls and serialise
/// `add`/`clear` against readers and against each other.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Get the name of this backend.
    fn provider_name(&self) -> &'static str;

    /// Add a batch of entries.
    ///
    /// The batch is all-or-nothing: duplicate ids (within the batch or against
    /// stored entries) and embeddings whose dimensionality differs from the
    /// index's reject the whole batch and leave committed entries untouched.
    ///
    /// # Returns
    ///
    /// Number of entries added.
    async fn add(&self, entries: Vec<IndexEntry>) -> Result<usize>;

    /// Return at most `k` entries, highest similarity first.
    ///
    /// Similarity is `1 - cosine_distance`. Ranks are 1-based without gaps;
    /// ties keep insertion order. An empty index yields an empty list.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Number of stored entries.
    async fn count(&self) -> Result<usize>;

    /// Remove every entry.
    async fn clear(&self) -> Result<()>;

    /// Index statistics.
    async fn stats(&self) -> Result<IndexStats>;
}
