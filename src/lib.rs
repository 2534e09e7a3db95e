//! # ragdesk
//!
//! Retrieval-augmented question answering over a pre-indexed document corpus.
//!
//! Scraped documents are split into overlapping chunks, embedded, and stored
//! in a vector index. Each question is embedded, the closest passages are
//! packed into a token-budgeted context block, and a language model answers
//! with that context plus the recent conversation for the session.
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use ragdesk::{ChatService, RagdeskConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = RagdeskConfig::load_or_default("ragdesk.toml")?;
//!     let service = ChatService::from_config(&config).await?;
//!     service.initialize_data().await?;
//!
//!     let answer = service.respond(None, "Who runs the office?", true).await;
//!     println!("{}", answer.response);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `local-embeddings` | In-process embeddings with fastembed (ONNX) |
//!
//! ## Modules
//!
//! - [`rag`] - Chunking, embeddings, retrieval, context assembly, ingestion
//! - [`db`] - Vector index abstraction over `ragdesk-vector`
//! - [`memory`] - Per-session conversation history and prompt building
//! - [`llm`] - Completion service clients (OpenAI, Ollama)
//! - [`chat`] - The request pipeline tying the pieces together
//! - [`api`] - REST API handlers and routes
//! - [`cli`] - Command-line interface

#![cfg_attr(docsrs, feature(doc_cfg))]

/// HTTP API handlers and routes.
pub mod api;
/// The chat pipeline.
pub mod chat;
/// Command-line interface.
pub mod cli;
/// Vector index providers.
pub mod db;
/// Answer feedback storage.
pub mod feedback;
/// Completion service clients.
pub mod llm;
/// Conversation memory.
pub mod memory;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

pub use chat::{ChatComponents, ChatService};
pub use db::{VectorIndex, VectorIndexProvider};
pub use llm::{CompletionService, Provider};
pub use rag::{EmbeddingProvider, Ingestor, Retriever, TextChunker};
pub use types::{AppError, Result};
pub use utils::toml_config::RagdeskConfig;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<RagdeskConfig>,
    /// Chat pipeline and session store
    pub chat: Arc<ChatService>,
}
