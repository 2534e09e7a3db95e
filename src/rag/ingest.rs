//! Build-time pipeline: documents → chunks → embeddings → index.
//!
//! Ingestion is skipped entirely when the index already holds entries. That
//! guard does not compare content, so changed source documents only reach
//! the index through [`Ingestor::reindex`].

use crate::db::VectorIndex;
use crate::rag::chunker::TextChunker;
use crate::rag::embeddings::EmbeddingProvider;
use crate::types::{AppError, IndexEntry, Result, SourceDocument};
use async_trait::async_trait;
use ragdesk_vector::VectorMetadata;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

// ============= Document Sources =============

/// Supplies the documents to index.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn load(&self) -> Result<Vec<SourceDocument>>;

    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;
}

/// JSON file holding a list of scraped documents.
pub struct JsonDocumentSource {
    path: PathBuf,
}

impl JsonDocumentSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl DocumentSource for JsonDocumentSource {
    /// A missing file yields no documents.
    async fn load(&self) -> Result<Vec<SourceDocument>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Document file not found");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(AppError::Internal(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&content).map_err(|e| {
            AppError::InvalidInput(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait]
impl DocumentSource for Vec<SourceDocument> {
    async fn load(&self) -> Result<Vec<SourceDocument>> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory documents", self.len())
    }
}

// ============= Ingestor =============

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub indexed: usize,
    /// The index already had entries; nothing was read.
    pub skipped: bool,
}

impl IngestReport {
    /// The index holds data after this run.
    pub fn has_data(&self) -> bool {
        self.skipped || self.indexed > 0
    }
}

pub struct Ingestor {
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    batch_size: usize,
}

impl Ingestor {
    pub fn new(
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        batch_size: usize,
    ) -> Self {
        Self {
            chunker,
            embedder,
            index,
            batch_size: batch_size.max(1),
        }
    }

    /// Index every document from `source` unless the index is already populated.
    pub async fn ingest(&self, source: &dyn DocumentSource) -> Result<IngestReport> {
        let existing = self.index.count().await?;
        if existing > 0 {
            info!(existing, "Index already contains data, skipping ingestion");
            return Ok(IngestReport {
                skipped: true,
                ..Default::default()
            });
        }

        let documents = source.load().await?;
        if documents.is_empty() {
            warn!(source = %source.describe(), "No documents to index");
            return Ok(IngestReport::default());
        }

        let pending = self.prepare(&documents);
        let mut report = IngestReport {
            documents: documents.len(),
            chunks: pending.len(),
            ..Default::default()
        };

        if pending.is_empty() {
            warn!(documents = documents.len(), "Documents contained no text to index");
            return Ok(report);
        }

        let texts: Vec<String> = pending.iter().map(|p| p.text.clone()).collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let vectors = self.embedder.encode(batch).await?;
            if vectors.len() != batch.len() {
                return Err(AppError::Provider(format!(
                    "Embedding provider returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }
            embeddings.extend(vectors);
        }

        let entries: Vec<IndexEntry> = pending
            .into_iter()
            .zip(embeddings)
            .map(|(p, embedding)| IndexEntry {
                id: p.id,
                embedding,
                text: p.text,
                metadata: p.metadata,
            })
            .collect();

        report.indexed = self.index.add(entries).await?;
        info!(
            documents = report.documents,
            chunks = report.indexed,
            source = %source.describe(),
            "Indexed documents"
        );
        Ok(report)
    }

    /// Clear the index, then ingest.
    pub async fn reindex(&self, source: &dyn DocumentSource) -> Result<IngestReport> {
        self.index.clear().await?;
        info!("Cleared index for re-ingestion");
        self.ingest(source).await
    }

    fn prepare(&self, documents: &[SourceDocument]) -> Vec<PendingChunk> {
        let mut pending = Vec::new();

        for (i, doc) in documents.iter().enumerate() {
            let texts: Vec<String> = if doc.chunks.is_empty() {
                let doc_id = format!("doc_{}", i);
                self.chunker
                    .chunk(&doc_id, &doc.raw_text)
                    .into_iter()
                    .map(|c| c.text)
                    .collect()
            } else {
                doc.chunks.clone()
            };

            let total = texts.len();
            for (j, text) in texts.into_iter().enumerate() {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let mut metadata = VectorMetadata::new();
                metadata.insert("url", doc.url.as_str());
                metadata.insert("title", doc.title.as_str());
                metadata.insert("chunk_index", j as i64);
                metadata.insert("total_chunks", total as i64);
                for (key, value) in &doc.metadata {
                    metadata.insert(key.as_str(), value.as_str());
                }

                pending.push(PendingChunk {
                    id: format!("doc_{}_chunk_{}", i, j),
                    text: trimmed.to_string(),
                    metadata,
                });
            }
        }

        pending
    }
}

struct PendingChunk {
    id: String,
    text: String,
    metadata: VectorMetadata,
}
