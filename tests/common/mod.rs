#![allow(dead_code)]

pub mod mocks;

use mocks::{KeywordEmbedder, MemoryFeedbackSink, MockCompletion};
use ragdesk::chat::{ChatComponents, ChatService};
use ragdesk::db::{EmbeddedIndex, VectorIndex};
use ragdesk::types::SourceDocument;
use ragdesk::RagdeskConfig;
use std::sync::Arc;

/// A chat service wired to mocks, with handles to inspect them.
pub struct Harness {
    pub service: Arc<ChatService>,
    pub completion: Arc<MockCompletion>,
    pub embedder: Arc<KeywordEmbedder>,
    pub feedback: Arc<MemoryFeedbackSink>,
    pub index: Arc<dyn VectorIndex>,
    pub config: RagdeskConfig,
}

/// In-memory configuration with no files touched.
pub fn test_config() -> RagdeskConfig {
    let mut config = RagdeskConfig::default();
    config.index.persist_directory = None;
    config.index.collection = "test".to_string();
    config.llm.model = "mock-model".to_string();
    config
}

pub fn sample_documents() -> Vec<SourceDocument> {
    vec![
        SourceDocument {
            url: "https://example.org/budget".into(),
            title: "Annual Budget".into(),
            raw_text: "The minister presented the budget. The budget funds education and health."
                .into(),
            ..Default::default()
        },
        SourceDocument {
            url: "https://example.org/contact".into(),
            title: "Contact the Office".into(),
            raw_text: "You can contact the office by email. The office is open on weekdays."
                .into(),
            ..Default::default()
        },
        SourceDocument {
            url: "https://example.org/river".into(),
            title: "River Energy Project".into(),
            raw_text: "The river energy project will supply energy to the region.".into(),
            ..Default::default()
        },
    ]
}

pub async fn harness(completion: MockCompletion) -> Harness {
    harness_with(test_config(), completion, KeywordEmbedder::new(), MemoryFeedbackSink::default())
        .await
}

pub async fn harness_with(
    config: RagdeskConfig,
    completion: MockCompletion,
    embedder: KeywordEmbedder,
    feedback: MemoryFeedbackSink,
) -> Harness {
    let completion = Arc::new(completion);
    let embedder = Arc::new(embedder);
    let feedback = Arc::new(feedback);
    let index: Arc<dyn VectorIndex> = Arc::new(
        EmbeddedIndex::in_memory(&config.index.collection, "keyword-mock")
            .await
            .unwrap(),
    );

    let service = ChatService::new(
        ChatComponents {
            embedder: embedder.clone(),
            index: index.clone(),
            completion: completion.clone(),
            feedback: feedback.clone(),
            documents: Arc::new(sample_documents()),
        },
        &config,
    )
    .unwrap();

    Harness {
        service: Arc::new(service),
        completion,
        embedder,
        feedback,
        index,
        config,
    }
}

/// Harness with the sample documents already indexed.
pub async fn indexed_harness(completion: MockCompletion) -> Harness {
    let harness = harness(completion).await;
    harness.service.initialize_data().await.unwrap();
    harness
}
