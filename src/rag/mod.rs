//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! # Module Structure
//!
//! - [`chunker`] - Sentence-aware text chunking
//! - [`embeddings`] - Embedding providers (OpenAI-compatible, Ollama, fastembed)
//! - [`ingest`] - Document sources and the build-time indexing pipeline
//! - [`retriever`] - Query embedding + vector search
//! - [`context`] - Token-budgeted context assembly
//!
//! # Pipeline
//!
//! Build time: documents → [`chunker::TextChunker`] → [`embeddings::EmbeddingProvider`]
//! → [`crate::db::VectorIndex`].
//!
//! Query time: question → [`retriever::Retriever`] → [`context::assemble`] →
//! [`crate::memory::Conversation::build_prompt`] → completion.
//!
//! # Example
//!
//! ```ignore
//! use ragdesk::rag::{chunker::TextChunker, context, retriever::Retriever};
//!
//! let chunker = TextChunker::new(1000, 200)?;
//! let chunks = chunker.chunk("doc_0", &document_text);
//!
//! let retriever = Retriever::new(embedder, index);
//! let retrieval = retriever.retrieve("Who runs the office?", 10).await;
//! let context = context::assemble(&retrieval.results, 2000);
//! ```

pub mod chunker;
pub mod context;
pub mod embeddings;
pub mod ingest;
pub mod retriever;

pub use chunker::TextChunker;
pub use context::{assemble, estimate_tokens, AssembledContext};
pub use embeddings::{create_embedding_provider, EmbeddingProvider};
pub use ingest::{DocumentSource, IngestReport, Ingestor, JsonDocumentSource};
pub use retriever::{Retrieval, Retriever};
