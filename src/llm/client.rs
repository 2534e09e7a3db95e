//! Completion service abstraction and provider selection
//!
//! - **OpenAI**: any OpenAI-compatible `/chat/completions` endpoint
//! - **Ollama**: local inference through `/api/chat`

use crate::types::{ChatMessage, Result};
use crate::utils::toml_config::{LlmProviderKind, RagdeskConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// Generation parameters for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionOptions {
    pub fn from_config(config: &RagdeskConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        }
    }
}

/// Generates answer text from an ordered message list.
///
/// `Ok(None)` means the provider answered without any content; callers record
/// it as an empty assistant turn.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Option<String>>;

    /// Provider name for logs and diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including Azure OpenAI and compatible APIs)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://api.openai.com/v1".to_string(),
    ///     timeout_secs: 60,
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        timeout_secs: u64,
    },

    /// Ollama local LLM provider
    Ollama { base_url: String, timeout_secs: u64 },
}

impl Provider {
    /// Build the provider named in `[llm]`, resolving its API key.
    pub fn from_config(config: &RagdeskConfig) -> Result<Self> {
        let llm = &config.llm;
        Ok(match llm.provider {
            LlmProviderKind::OpenAI => Provider::OpenAI {
                api_key: config.llm_api_key()?,
                api_base: llm.resolved_api_base(),
                timeout_secs: llm.request_timeout_secs,
            },
            LlmProviderKind::Ollama => Provider::Ollama {
                base_url: llm.resolved_api_base(),
                timeout_secs: llm.request_timeout_secs,
            },
        })
    }

    /// Create a client instance for this provider
    pub fn create_client(&self) -> Result<Arc<dyn CompletionService>> {
        match self {
            Provider::OpenAI {
                api_key,
                api_base,
                timeout_secs,
            } => Ok(Arc::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base,
                *timeout_secs,
            )?)),

            Provider::Ollama {
                base_url,
                timeout_secs,
            } => Ok(Arc::new(super::ollama::OllamaClient::new(
                base_url,
                *timeout_secs,
            )?)),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }
}
