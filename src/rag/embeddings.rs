//! Embedding providers.
//!
//! Every provider implements [`EmbeddingProvider::encode`]: one vector per
//! input, same order, and either all vectors or an error.
//!
//! - [`OpenAIEmbeddings`] - any OpenAI-compatible `/embeddings` endpoint
//! - [`OllamaEmbeddings`] - Ollama's `/api/embed`
//! - [`FastEmbedProvider`] - local ONNX models (`local-embeddings` feature)

use crate::types::{AppError, Result};
use crate::utils::toml_config::{EmbeddingProviderKind, RagdeskConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Converts text to fixed-length vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts.
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Identifier of the model producing the vectors.
    fn model_name(&self) -> &str;

    /// Embed a single text.
    async fn encode_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.encode(&[text.to_string()]).await?;
        match (vectors.pop(), vectors.is_empty()) {
            (Some(vector), true) => Ok(vector),
            _ => Err(AppError::Provider(
                "Embedding provider returned an unexpected number of vectors".into(),
            )),
        }
    }
}

/// Check the one-vector-per-input contract.
fn ensure_count(expected: usize, vectors: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>> {
    if vectors.len() != expected {
        return Err(AppError::Provider(format!(
            "Embedding provider returned {} vectors for {} inputs",
            vectors.len(),
            expected
        )));
    }
    Ok(vectors)
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

// ============= OpenAI-compatible =============

pub struct OpenAIEmbeddings {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct OpenAIEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAIEmbeddings {
    pub fn new(api_key: String, api_base: &str, model: String, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            endpoint: format!("{}/embeddings", api_base.trim_end_matches('/')),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.trim())
            .json(&OpenAIEmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "Embedding request failed ({}): {}",
                status, text
            )));
        }

        let mut parsed: OpenAIEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Invalid embedding response: {}", e)))?;

        parsed.data.sort_by_key(|d| d.index);
        ensure_count(
            texts.len(),
            parsed.data.into_iter().map(|d| d.embedding).collect(),
        )
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============= Ollama =============

pub struct OllamaEmbeddings {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbeddings {
    pub fn new(base_url: &str, model: String, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            endpoint: format!("{}/api/embed", base_url.trim_end_matches('/')),
            model,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddings {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&OllamaEmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Ollama embed request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "Ollama embed request failed ({}): {}",
                status, text
            )));
        }

        let parsed: OllamaEmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Invalid Ollama embed response: {}", e)))?;

        ensure_count(texts.len(), parsed.embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============= Local (fastembed) =============

#[cfg(feature = "local-embeddings")]
pub struct FastEmbedProvider {
    model: Arc<parking_lot::Mutex<fastembed::TextEmbedding>>,
    model_name: String,
}

#[cfg(feature = "local-embeddings")]
impl FastEmbedProvider {
    /// Load a model by its common name. Downloads weights on first use.
    pub fn new(model_name: &str) -> Result<Self> {
        let model = fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(resolve_fastembed_model(model_name)?)
                .with_show_download_progress(false),
        )
        .map_err(|e| {
            AppError::Configuration(format!("Failed to load embedding model '{}': {}", model_name, e))
        })?;

        Ok(Self {
            model: Arc::new(parking_lot::Mutex::new(model)),
            model_name: model_name.to_string(),
        })
    }
}

#[cfg(feature = "local-embeddings")]
fn resolve_fastembed_model(name: &str) -> Result<fastembed::EmbeddingModel> {
    use fastembed::EmbeddingModel;

    let short = name.rsplit('/').next().unwrap_or(name).to_ascii_lowercase();
    match short.as_str() {
        "all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "all-minilm-l12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "bge-large-en-v1.5" => Ok(EmbeddingModel::BGELargeENV15),
        "nomic-embed-text-v1.5" => Ok(EmbeddingModel::NomicEmbedTextV15),
        "multilingual-e5-small" => Ok(EmbeddingModel::MultilingualE5Small),
        _ => Err(AppError::Configuration(format!(
            "Unsupported local embedding model '{}'",
            name
        ))),
    }
}

#[cfg(feature = "local-embeddings")]
#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let owned = texts.to_vec();
        let vectors = tokio::task::spawn_blocking(move || model.lock().embed(owned, None))
            .await
            .map_err(|e| AppError::Internal(format!("Embedding task failed: {}", e)))?
            .map_err(|e| AppError::Provider(format!("Local embedding failed: {}", e)))?;

        ensure_count(texts.len(), vectors)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

// ============= Factory =============

/// Build the embedding provider named in `[embeddings]`.
pub fn create_embedding_provider(config: &RagdeskConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let settings = &config.embeddings;
    match settings.provider {
        EmbeddingProviderKind::OpenAI => Ok(Arc::new(OpenAIEmbeddings::new(
            config.embeddings_api_key()?,
            &settings.resolved_api_base(),
            settings.model.clone(),
            settings.request_timeout_secs,
        )?)),
        EmbeddingProviderKind::Ollama => Ok(Arc::new(OllamaEmbeddings::new(
            &settings.resolved_api_base(),
            settings.model.clone(),
            settings.request_timeout_secs,
        )?)),
        #[cfg(feature = "local-embeddings")]
        EmbeddingProviderKind::FastEmbed => Ok(Arc::new(FastEmbedProvider::new(&settings.model)?)),
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingProviderKind::FastEmbed => Err(AppError::Configuration(
            "embeddings.provider = \"fastembed\" requires the `local-embeddings` feature; \
             rebuild with it or switch to \"openai\" or \"ollama\""
                .into(),
        )),
    }
}
