//! TOML-based configuration for ragdesk
//!
//! Settings are read from `ragdesk.toml`. Every section and field has a
//! default, so a partial (or missing) file is valid. Secrets are never stored
//! in the file: providers name the environment variable that holds the key.
//!
//! A handful of environment variables from earlier deployments override the
//! file (`MODEL_NAME`, `TEMPERATURE`, `MAX_TOKENS`, `VECTOR_PERSIST_DIRECTORY`,
//! `EMBEDDING_MODEL_NAME`); see [`RagdeskConfig::apply_env_overrides`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Root configuration structure loaded from ragdesk.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagdeskConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub rag: RagConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub data: DataConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// ============= Completion Provider Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// OpenAI API or any compatible `/chat/completions` endpoint
    #[default]
    OpenAI,
    /// Ollama server
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProviderKind,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Base URL; defaults depend on the provider
    #[serde(default)]
    pub api_base: Option<String>,

    /// Environment variable containing the API key (OpenAI only)
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

pub(crate) fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

pub(crate) fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_base: None,
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl LlmConfig {
    /// Base URL with the provider default filled in.
    pub fn resolved_api_base(&self) -> String {
        match (&self.api_base, self.provider) {
            (Some(base), _) => base.trim_end_matches('/').to_string(),
            (None, LlmProviderKind::OpenAI) => default_openai_base(),
            (None, LlmProviderKind::Ollama) => default_ollama_url(),
        }
    }
}

// ============= Embedding Provider Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Local ONNX models via fastembed (requires the `local-embeddings` feature)
    #[default]
    FastEmbed,
    /// OpenAI-compatible `/embeddings` endpoint
    OpenAI,
    /// Ollama `/api/embed`
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default)]
    pub api_base: Option<String>,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Texts per provider call during ingestion
    #[serde(default = "default_embed_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_embed_batch_size() -> usize {
    64
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            model: default_embedding_model(),
            api_base: None,
            api_key_env: default_api_key_env(),
            batch_size: default_embed_batch_size(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl EmbeddingsConfig {
    /// Base URL with the provider default filled in.
    pub fn resolved_api_base(&self) -> String {
        match (&self.api_base, self.provider) {
            (Some(base), _) => base.trim_end_matches('/').to_string(),
            (None, EmbeddingProviderKind::Ollama) => default_ollama_url(),
            (None, _) => default_openai_base(),
        }
    }
}

// ============= Index Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory for persisted vectors; `None` keeps the index in memory
    #[serde(default = "default_persist_directory")]
    pub persist_directory: Option<String>,

    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_persist_directory() -> Option<String> {
    Some("./data/vectors".to_string())
}

fn default_collection() -> String {
    "documents".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            persist_directory: default_persist_directory(),
            collection: default_collection(),
        }
    }
}

// ============= RAG Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Passages retrieved when building chat context
    #[serde(default = "default_context_top_k")]
    pub context_top_k: usize,

    /// Passages returned by plain document search
    #[serde(default = "default_search_k")]
    pub search_k: usize,

    /// Token budget for the assembled context
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_context_top_k() -> usize {
    10
}

fn default_search_k() -> usize {
    5
}

fn default_max_context_tokens() -> usize {
    2000
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            context_top_k: default_context_top_k(),
            search_k: default_search_k(),
            max_context_tokens: default_max_context_tokens(),
        }
    }
}

// ============= Chat Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Turns of history included in each prompt
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    #[serde(default = "default_suggested_questions")]
    pub suggested_questions: Vec<String>,
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant for this website. Your role is to help users find information published on it: policies and announcements, programs and initiatives, speeches and statements, and administrative details.

Always be helpful, accurate, and professional. If you don't have information about something, say so clearly. Base your responses on the provided context from the website.

Key guidelines:
- Be respectful and maintain a professional tone
- Provide accurate information based on the context
- If asked about something not in the context, say you don't have that information
- Always cite sources when possible
- Be concise but informative";

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_history_window() -> usize {
    crate::memory::DEFAULT_HISTORY_WINDOW
}

fn default_suggested_questions() -> Vec<String> {
    [
        "What is this organization?",
        "What are its main functions?",
        "How can I contact the office?",
        "What are the latest announcements?",
        "What initiatives have been announced recently?",
        "What are the key policies?",
    ]
    .iter()
    .map(|q| q.to_string())
    .collect()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            history_window: default_history_window(),
            suggested_questions: default_suggested_questions(),
        }
    }
}

// ============= Data Files =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON list of scraped documents
    #[serde(default = "default_documents_file")]
    pub documents_file: String,

    /// JSON-lines feedback log
    #[serde(default = "default_feedback_file")]
    pub feedback_file: String,
}

fn default_documents_file() -> String {
    "data/scraped_data.json".to_string()
}

fn default_feedback_file() -> String {
    "data/feedback.jsonl".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            documents_file: default_documents_file(),
            feedback_file: default_feedback_file(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl RagdeskConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: RagdeskConfig = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    ///
    /// Environment overrides are applied in both cases.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = match Self::load(path) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded configuration");
                config
            }
            Err(ConfigError::FileNotFound(_)) => {
                warn!(path = %path.display(), "Configuration file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply legacy environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Some(model) = non_empty_env("MODEL_NAME") {
            self.llm.model = model;
        }
        if let Some(temperature) = non_empty_env("TEMPERATURE") {
            match temperature.parse() {
                Ok(value) => self.llm.temperature = value,
                Err(_) => warn!(value = %temperature, "Ignoring invalid TEMPERATURE"),
            }
        }
        if let Some(max_tokens) = non_empty_env("MAX_TOKENS") {
            match max_tokens.parse() {
                Ok(value) => self.llm.max_tokens = value,
                Err(_) => warn!(value = %max_tokens, "Ignoring invalid MAX_TOKENS"),
            }
        }
        if let Some(dir) = non_empty_env("VECTOR_PERSIST_DIRECTORY") {
            self.index.persist_directory = Some(dir);
        }
        if let Some(model) = non_empty_env("EMBEDDING_MODEL_NAME") {
            self.embeddings.model = model;
        }
    }

    /// Validate value ranges. Does not touch the environment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "rag.chunk_size must be greater than zero".into(),
            ));
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "llm.max_tokens must be greater than zero".into(),
            ));
        }
        if self.embeddings.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embeddings.batch_size must be greater than zero".into(),
            ));
        }
        if self.index.collection.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "index.collection must not be empty".into(),
            ));
        }
        if !matches!(self.server.log_format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "server.log_format must be 'pretty' or 'json', got '{}'",
                self.server.log_format
            )));
        }
        Ok(())
    }

    /// Check that every referenced secret is present in the environment.
    pub fn validate_secrets(&self) -> Result<(), ConfigError> {
        if self.llm.provider == LlmProviderKind::OpenAI {
            self.validate_env_var(&self.llm.api_key_env)?;
        }
        if self.embeddings.provider == EmbeddingProviderKind::OpenAI {
            self.validate_env_var(&self.embeddings.api_key_env)?;
        }
        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// API key for the completion provider.
    pub fn llm_api_key(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.llm.api_key_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.llm.api_key_env.clone()))
    }

    /// API key for the embedding provider.
    pub fn embeddings_api_key(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.embeddings.api_key_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.embeddings.api_key_env.clone()))
    }

    /// Socket address string for the HTTP server.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
