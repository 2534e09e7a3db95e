//! Query-time retrieval: embed the query, search the index.

use crate::db::VectorIndex;
use crate::rag::embeddings::EmbeddingProvider;
use crate::types::{AppError, SearchResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a retrieval.
///
/// A failure never fabricates results: `results` is empty and `error`
/// describes what went wrong.
#[derive(Debug, Default)]
pub struct Retrieval {
    pub results: Vec<SearchResult>,
    pub error: Option<AppError>,
}

impl Retrieval {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Top `k` passages for `query`, best first.
    pub async fn retrieve(&self, query: &str, k: usize) -> Retrieval {
        let embedding = match self.embedder.encode_one(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "Query embedding failed");
                return Retrieval {
                    results: Vec::new(),
                    error: Some(e),
                };
            }
        };

        match self.index.query(&embedding, k).await {
            Ok(results) => {
                debug!(k, found = results.len(), "Retrieved passages");
                Retrieval {
                    results,
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Index query failed");
                Retrieval {
                    results: Vec::new(),
                    error: Some(e),
                }
            }
        }
    }
}
