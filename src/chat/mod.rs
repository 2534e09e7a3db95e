//! Question answering over the indexed corpus.
//!
//! [`ChatService`] ties the pipeline together for one request: lock the
//! session, retrieve passages, assemble context, build the prompt, call the
//! completion service, and only then record the exchange. Provider failures
//! never escape [`ChatService::respond`]; they turn into a fallback answer
//! with an `error` detail.

use crate::db::{VectorIndex, VectorIndexProvider};
use crate::feedback::{FeedbackSink, JsonlFeedbackSink};
use crate::llm::{CompletionOptions, CompletionService, Provider};
use crate::memory::SessionStore;
use crate::rag::{
    create_embedding_provider, AssembledContext, DocumentSource, EmbeddingProvider, IngestReport,
    Ingestor, JsonDocumentSource, Retriever, TextChunker,
};
use crate::types::{
    AppError, ChatResponse, ConversationTurn, FeedbackInput, FeedbackRecord, IndexStats,
    MessageRole, Result, SearchResult, SystemInfo,
};
use crate::utils::toml_config::RagdeskConfig;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Answer returned when the completion service fails.
pub const FALLBACK_RESPONSE: &str =
    "I apologize, but I'm experiencing technical difficulties. Please try again later.";

/// Per-request knobs taken from configuration.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub system_prompt: String,
    pub history_window: usize,
    pub context_top_k: usize,
    pub search_k: usize,
    pub max_context_tokens: usize,
    pub completion: CompletionOptions,
    pub request_timeout: Duration,
    pub suggested_questions: Vec<String>,
}

impl ChatSettings {
    pub fn from_config(config: &RagdeskConfig) -> Self {
        Self {
            system_prompt: config.chat.system_prompt.clone(),
            history_window: config.chat.history_window,
            context_top_k: config.rag.context_top_k,
            search_k: config.rag.search_k,
            max_context_tokens: config.rag.max_context_tokens,
            completion: CompletionOptions::from_config(config),
            request_timeout: Duration::from_secs(config.llm.request_timeout_secs),
            suggested_questions: config.chat.suggested_questions.clone(),
        }
    }
}

/// Collaborators the chat service is built from.
pub struct ChatComponents {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub index: Arc<dyn VectorIndex>,
    pub completion: Arc<dyn CompletionService>,
    pub feedback: Arc<dyn FeedbackSink>,
    pub documents: Arc<dyn DocumentSource>,
}

pub struct ChatService {
    retriever: Retriever,
    ingestor: Ingestor,
    completion: Arc<dyn CompletionService>,
    feedback: Arc<dyn FeedbackSink>,
    documents: Arc<dyn DocumentSource>,
    sessions: SessionStore,
    settings: ChatSettings,
}

impl ChatService {
    pub fn new(components: ChatComponents, config: &RagdeskConfig) -> Result<Self> {
        let chunker = TextChunker::new(config.rag.chunk_size, config.rag.chunk_overlap)?;
        let ingestor = Ingestor::new(
            chunker,
            Arc::clone(&components.embedder),
            Arc::clone(&components.index),
            config.embeddings.batch_size,
        );

        Ok(Self {
            retriever: Retriever::new(components.embedder, components.index),
            ingestor,
            completion: components.completion,
            feedback: components.feedback,
            documents: components.documents,
            sessions: SessionStore::new(),
            settings: ChatSettings::from_config(config),
        })
    }

    /// Build every collaborator from configuration.
    pub async fn from_config(config: &RagdeskConfig) -> Result<Self> {
        let embedder = create_embedding_provider(config)?;
        let index = VectorIndexProvider::from_config(config).create_index().await?;
        let completion = Provider::from_config(config)?.create_client()?;

        Self::new(
            ChatComponents {
                embedder,
                index,
                completion,
                feedback: Arc::new(JsonlFeedbackSink::new(&config.data.feedback_file)),
                documents: Arc::new(JsonDocumentSource::new(&config.data.documents_file)),
            },
            config,
        )
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        self.retriever.index()
    }

    /// Answer `message` within a session. A missing session id starts a new one.
    pub async fn respond(
        &self,
        session_id: Option<String>,
        message: &str,
        use_context: bool,
    ) -> ChatResponse {
        let session_id = session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let conversation = self.sessions.get_or_create(&session_id);
        let mut conversation = conversation.lock().await;

        let mut diagnostics = None;
        let context = if use_context {
            let retrieval = self
                .retriever
                .retrieve(message, self.settings.context_top_k)
                .await;
            if let Some(e) = retrieval.error {
                diagnostics = Some(format!("Context retrieval failed: {}", e));
            }
            AssembledContext::build(retrieval.results, self.settings.max_context_tokens)
        } else {
            AssembledContext::default()
        };

        let messages = conversation.build_prompt_with_pending(
            &self.settings.system_prompt,
            &context.text,
            self.settings.history_window,
            message,
        );

        let completion = tokio::time::timeout(
            self.settings.request_timeout,
            self.completion.complete(&messages, &self.settings.completion),
        )
        .await
        .unwrap_or_else(|_| {
            Err(AppError::Provider(format!(
                "Completion timed out after {}s",
                self.settings.request_timeout.as_secs()
            )))
        });

        let model_used = self.settings.completion.model.clone();
        match completion {
            Ok(answer) => {
                let answer = answer.unwrap_or_default();
                conversation.record(MessageRole::User, message);
                conversation.record(MessageRole::Assistant, answer.clone());

                info!(
                    session_id = %session_id,
                    context_chars = context.text.chars().count(),
                    sources = context.included.len(),
                    "Generated response"
                );

                ChatResponse {
                    response: answer,
                    session_id,
                    context_used: !context.is_empty(),
                    context_length: context.text.chars().count(),
                    sources: context.included.iter().map(SearchResult::to_source).collect(),
                    timestamp: Utc::now(),
                    model_used,
                    error: diagnostics,
                }
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Error generating response");
                ChatResponse {
                    response: FALLBACK_RESPONSE.to_string(),
                    session_id,
                    context_used: false,
                    context_length: 0,
                    sources: Vec::new(),
                    timestamp: Utc::now(),
                    model_used,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Ranked passages for `query`; `k` defaults to the configured search size.
    pub async fn search_documents(&self, query: &str, k: Option<usize>) -> Result<Vec<SearchResult>> {
        let k = k.unwrap_or(self.settings.search_k);
        let retrieval = self.retriever.retrieve(query, k).await;
        match retrieval.error {
            Some(e) => Err(e),
            None => Ok(retrieval.results),
        }
    }

    /// Full history of a session; empty for unknown sessions.
    pub async fn history(&self, session_id: &str) -> Vec<ConversationTurn> {
        match self.sessions.get(session_id) {
            Some(conversation) => conversation.lock().await.history().to_vec(),
            None => Vec::new(),
        }
    }

    pub async fn clear_history(&self, session_id: &str) {
        if let Some(conversation) = self.sessions.get(session_id) {
            conversation.lock().await.clear();
            info!(session_id, "Conversation history cleared");
        }
    }

    pub async fn index_stats(&self) -> Result<IndexStats> {
        self.retriever.index().stats().await
    }

    /// Model settings, index statistics and the session's history length.
    pub async fn system_info(&self, session_id: Option<&str>) -> SystemInfo {
        let vector_store_stats = match self.index_stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(error = %e, "Failed to read index statistics");
                None
            }
        };

        let conversation_length = match session_id.and_then(|id| self.sessions.get(id)) {
            Some(conversation) => conversation.lock().await.len(),
            None => 0,
        };

        SystemInfo {
            model_name: self.settings.completion.model.clone(),
            temperature: self.settings.completion.temperature,
            max_tokens: self.settings.completion.max_tokens,
            vector_store_stats,
            conversation_length,
        }
    }

    pub fn suggested_questions(&self) -> &[String] {
        &self.settings.suggested_questions
    }

    /// Store feedback. Returns whether it was persisted.
    pub async fn submit_feedback(&self, input: FeedbackInput) -> bool {
        let record = FeedbackRecord::from(input);
        match self.feedback.record(&record).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Error processing feedback");
                false
            }
        }
    }

    /// Index the configured documents unless the index already has data.
    pub async fn initialize_data(&self) -> Result<IngestReport> {
        info!(source = %self.documents.describe(), "Initializing data");
        let report = self.ingestor.ingest(self.documents.as_ref()).await?;
        if !report.has_data() {
            warn!("Initialized with no indexed data");
        }
        Ok(report)
    }

    /// Drop the index and rebuild it from the configured documents.
    pub async fn reindex(&self) -> Result<IngestReport> {
        self.ingestor.reindex(self.documents.as_ref()).await
    }

    /// Ingest from an explicit source instead of the configured one.
    pub async fn ingest_from(&self, source: &dyn DocumentSource, reindex: bool) -> Result<IngestReport> {
        if reindex {
            self.ingestor.reindex(source).await
        } else {
            self.ingestor.ingest(source).await
        }
    }

    pub async fn clear_index(&self) -> Result<()> {
        self.retriever.index().clear().await
    }
}
