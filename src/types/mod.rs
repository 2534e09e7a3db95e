use chrono::{DateTime, Utc};
use ragdesk_vector::VectorMetadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_context: Option<bool>,
}

/// Outcome of one chat turn. Always produced, even when a provider fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub context_used: bool,
    /// Length of the assembled context in characters.
    pub context_length: usize,
    #[serde(default)]
    pub sources: Vec<Source>,
    pub timestamp: DateTime<Utc>,
    pub model_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Source {
    pub title: String,
    pub url: Option<String>,
    pub relevance_score: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub turns: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub indexed_chunks: usize,
}

/// Snapshot of runtime settings and index state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub vector_store_stats: Option<IndexStats>,
    pub conversation_length: usize,
}

// ============= Conversation Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One stored turn of a conversation. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A message sent to the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// ============= Feedback Types =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackInput {
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub assistant_response: String,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub helpful: bool,
}

/// A feedback entry as persisted, one per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub assistant_response: String,
    pub rating: i32,
    pub comments: String,
    pub helpful: bool,
}

impl From<FeedbackInput> for FeedbackRecord {
    fn from(input: FeedbackInput) -> Self {
        Self {
            timestamp: Utc::now(),
            user_message: input.user_message,
            assistant_response: input.assistant_response,
            rating: input.rating,
            comments: input.comments,
            helpful: input.helpful,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub accepted: bool,
}

// ============= RAG Types =============

/// A scraped page as persisted by the crawler.
///
/// Either `raw_text` (also accepted as `content`) or pre-split `chunks` must be
/// present for the document to contribute to the index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "content")]
    pub raw_text: String,
    #[serde(default)]
    pub chunks: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// A contiguous slice of one document's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub source_document_id: String,
    pub sequence_index: usize,
    pub text: String,
    /// Character offset (inclusive) into the source text.
    pub char_start: usize,
    /// Character offset (exclusive) into the source text.
    pub char_end: usize,
}

/// A chunk ready to be stored in the vector index.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: VectorMetadata,
}

/// A ranked passage returned by the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub text: String,
    pub metadata: VectorMetadata,
    pub similarity_score: f32,
    /// 1-based, gap-free.
    pub rank: usize,
}

impl SearchResult {
    /// Title metadata, or `"Unknown"` when absent or empty.
    pub fn title(&self) -> String {
        self.metadata
            .get("title")
            .map(|v| v.as_text())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn url(&self) -> Option<String> {
        self.metadata
            .get("url")
            .map(|v| v.as_text())
            .filter(|u| !u.is_empty())
    }

    pub fn to_source(&self) -> Source {
        Source {
            title: self.title(),
            url: self.url(),
            relevance_score: self.similarity_score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_entries: usize,
    pub collection_name: String,
    pub embedding_model: String,
    pub dimensions: Option<usize>,
    pub provider: String,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ragdesk_vector::Error> for AppError {
    fn from(err: ragdesk_vector::Error) -> Self {
        match err {
            ragdesk_vector::Error::CollectionNotFound(name) => {
                AppError::NotFound(format!("Collection '{}' not found", name))
            }
            other => AppError::Index(other.to_string()),
        }
    }
}

impl From<crate::utils::toml_config::ConfigError> for AppError {
    fn from(err: crate::utils::toml_config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Response body for provider failures; the upstream detail is only logged.
pub const PROVIDER_UNAVAILABLE: &str =
    "The language or embedding service is unavailable right now. Please try again later.";

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Configuration(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Provider(msg) => {
                tracing::warn!(error = %msg, "Upstream provider request failed");
                (
                    axum::http::StatusCode::BAD_GATEWAY,
                    PROVIDER_UNAVAILABLE.to_string(),
                )
            }
            AppError::Index(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
