//! Completion Service Clients
//!
//! The chat pipeline depends only on [`CompletionService`]. Concrete clients
//! talk HTTP through `reqwest`:
//!
//! - [`openai::OpenAIClient`] - OpenAI and compatible APIs
//! - [`ollama::OllamaClient`] - local Ollama server
//!
//! # Example
//!
//! ```ignore
//! use ragdesk::llm::{CompletionOptions, Provider};
//!
//! let client = Provider::from_config(&config)?.create_client()?;
//! let answer = client
//!     .complete(&messages, &CompletionOptions::from_config(&config))
//!     .await?;
//! ```

/// Core completion trait and provider selection.
pub mod client;
pub mod ollama;
pub mod openai;

pub use client::{CompletionOptions, CompletionService, Provider};
