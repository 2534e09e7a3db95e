//! Mock collaborators shared by the integration tests.
//!
//! The embedder maps text onto a small fixed vocabulary so similarity is
//! predictable; the completion service records every prompt it receives.

use async_trait::async_trait;
use parking_lot::Mutex;
use ragdesk::feedback::FeedbackSink;
use ragdesk::llm::{CompletionOptions, CompletionService};
use ragdesk::rag::EmbeddingProvider;
use ragdesk::types::{AppError, ChatMessage, FeedbackRecord, Result};
use std::time::Duration;

/// Words the keyword embedder knows about, one dimension each.
pub const VOCABULARY: &[&str] = &[
    "budget", "health", "education", "minister", "office", "contact", "river", "energy",
];

/// Bag-of-words embedder over [`VOCABULARY`] plus a constant bias dimension.
#[derive(Default)]
pub struct KeywordEmbedder {
    fail: bool,
    calls: Mutex<usize>,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }

    pub fn embed(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut vector: Vec<f32> = VOCABULARY
            .iter()
            .map(|term| words.iter().filter(|w| *w == term).count() as f32)
            .collect();
        vector.push(0.1);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        *self.calls.lock() += 1;
        if self.fail {
            return Err(AppError::Provider("Mock embedding failure".to_string()));
        }
        Ok(texts.iter().map(|t| Self::embed(t)).collect())
    }

    fn model_name(&self) -> &str {
        "keyword-mock"
    }
}

#[derive(Clone)]
enum Behavior {
    Reply(String),
    Empty,
    Fail,
    Slow(Duration),
}

/// Completion service returning a canned answer and capturing prompts.
pub struct MockCompletion {
    behavior: Behavior,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockCompletion {
    pub fn new(response: &str) -> Self {
        Self::with_behavior(Behavior::Reply(response.to_string()))
    }

    /// Answers with no content at all.
    pub fn empty() -> Self {
        Self::with_behavior(Behavior::Empty)
    }

    pub fn failing() -> Self {
        Self::with_behavior(Behavior::Fail)
    }

    /// Sleeps before answering, for timeout tests.
    pub fn slow(delay: Duration) -> Self {
        Self::with_behavior(Behavior::Slow(delay))
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every message list sent so far.
    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().clone()
    }

    pub fn last_prompt(&self) -> Option<Vec<ChatMessage>> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl CompletionService for MockCompletion {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<Option<String>> {
        self.prompts.lock().push(messages.to_vec());
        match &self.behavior {
            Behavior::Reply(text) => Ok(Some(text.clone())),
            Behavior::Empty => Ok(None),
            Behavior::Fail => Err(AppError::Provider("Mock LLM failure".to_string())),
            Behavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Some("late answer".to_string()))
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Feedback sink keeping records in memory.
#[derive(Default)]
pub struct MemoryFeedbackSink {
    records: Mutex<Vec<FeedbackRecord>>,
    fail: bool,
}

impl MemoryFeedbackSink {
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn records(&self) -> Vec<FeedbackRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl FeedbackSink for MemoryFeedbackSink {
    async fn record(&self, feedback: &FeedbackRecord) -> Result<()> {
        if self.fail {
            return Err(AppError::Internal("Mock sink failure".to_string()));
        }
        self.records.lock().push(feedback.clone());
        Ok(())
    }
}
