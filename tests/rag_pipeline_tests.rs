//! End-to-end tests of the chat pipeline with mocked providers.

mod common;

use common::mocks::{KeywordEmbedder, MemoryFeedbackSink, MockCompletion};
use common::{harness, harness_with, indexed_harness, test_config};
use ragdesk::chat::FALLBACK_RESPONSE;
use ragdesk::types::{FeedbackInput, MessageRole};
use rstest::rstest;
use std::time::Duration;

#[tokio::test]
async fn test_respond_grounds_answer_in_retrieved_passages() {
    let h = indexed_harness(MockCompletion::new("The budget funds education.")).await;

    let response = h
        .service
        .respond(None, "What does the budget fund?", true)
        .await;

    assert_eq!(response.response, "The budget funds education.");
    assert!(uuid::Uuid::parse_str(&response.session_id).is_ok());
    assert!(response.context_used);
    assert!(response.context_length > 0);
    assert_eq!(response.model_used, "mock-model");
    assert!(response.error.is_none());
    assert_eq!(response.sources[0].title, "Annual Budget");
    assert_eq!(
        response.sources[0].url.as_deref(),
        Some("https://example.org/budget")
    );

    let prompt = h.completion.last_prompt().unwrap();
    assert_eq!(prompt[0].role, MessageRole::System);
    assert_eq!(prompt[0].content, h.config.chat.system_prompt);
    assert_eq!(prompt[1].role, MessageRole::System);
    assert!(prompt[1].content.contains("Source: Annual Budget"));
    let last = prompt.last().unwrap();
    assert_eq!(last.role, MessageRole::User);
    assert_eq!(last.content, "What does the budget fund?");
}

#[tokio::test]
async fn test_session_history_feeds_next_prompt() {
    let h = indexed_harness(MockCompletion::new("answer")).await;
    let session = Some("session-1".to_string());

    h.service.respond(session.clone(), "first question", true).await;
    let second = h.service.respond(session.clone(), "second question", true).await;
    assert_eq!(second.session_id, "session-1");

    let history = h.service.history("session-1").await;
    let roles: Vec<_> = history.iter().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant
        ]
    );
    assert_eq!(history[2].content, "second question");

    let prompt = h.completion.last_prompt().unwrap();
    let conversation: Vec<_> = prompt
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(conversation, vec!["first question", "answer", "second question"]);
}

#[tokio::test]
async fn test_blank_session_id_starts_new_session() {
    let h = harness(MockCompletion::new("hi")).await;

    let response = h.service.respond(Some("  ".to_string()), "hello", false).await;

    assert_ne!(response.session_id.trim(), "");
    assert_eq!(h.service.history(&response.session_id).await.len(), 2);
}

#[tokio::test]
async fn test_failed_completion_returns_fallback_and_records_nothing() {
    let h = indexed_harness(MockCompletion::failing()).await;

    let response = h
        .service
        .respond(Some("s".to_string()), "What is the budget?", true)
        .await;

    assert_eq!(response.response, FALLBACK_RESPONSE);
    assert!(response.error.unwrap().contains("Mock LLM failure"));
    assert!(!response.context_used);
    assert!(response.sources.is_empty());
    assert!(h.service.history("s").await.is_empty());
}

#[tokio::test]
async fn test_empty_completion_is_recorded_as_empty_turn() {
    let h = harness(MockCompletion::empty()).await;

    let response = h.service.respond(Some("s".to_string()), "hello", false).await;

    assert_eq!(response.response, "");
    assert!(response.error.is_none());
    let history = h.service.history("s").await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, MessageRole::Assistant);
    assert_eq!(history[1].content, "");
}

#[tokio::test]
async fn test_retrieval_failure_still_answers() {
    let h = harness_with(
        test_config(),
        MockCompletion::new("answer without context"),
        KeywordEmbedder::failing(),
        MemoryFeedbackSink::default(),
    )
    .await;

    let response = h.service.respond(Some("s".to_string()), "budget?", true).await;

    assert_eq!(response.response, "answer without context");
    assert!(!response.context_used);
    assert_eq!(response.context_length, 0);
    assert!(response
        .error
        .unwrap()
        .starts_with("Context retrieval failed"));
    assert_eq!(h.service.history("s").await.len(), 2);

    let prompt = h.completion.last_prompt().unwrap();
    assert_eq!(prompt.len(), 2);
}

#[tokio::test]
async fn test_context_disabled_skips_retrieval() {
    let h = harness(MockCompletion::new("ok")).await;

    let response = h.service.respond(None, "budget?", false).await;

    assert!(!response.context_used);
    assert_eq!(h.embedder.calls(), 0);
    let prompt = h.completion.last_prompt().unwrap();
    assert_eq!(prompt.len(), 2);
    assert_eq!(prompt[1].content, "budget?");
}

#[tokio::test]
async fn test_empty_index_answers_without_context() {
    let h = harness(MockCompletion::new("no idea")).await;

    let response = h.service.respond(None, "budget?", true).await;

    assert_eq!(response.response, "no idea");
    assert!(!response.context_used);
    assert!(response.sources.is_empty());
    assert!(response.error.is_none());
}

#[tokio::test]
async fn test_completion_timeout_uses_fallback() {
    let mut config = test_config();
    config.llm.request_timeout_secs = 1;
    let h = harness_with(
        config,
        MockCompletion::slow(Duration::from_secs(5)),
        KeywordEmbedder::new(),
        MemoryFeedbackSink::default(),
    )
    .await;

    let response = h.service.respond(Some("s".to_string()), "hello", false).await;

    assert_eq!(response.response, FALLBACK_RESPONSE);
    assert!(response.error.unwrap().contains("timed out"));
    assert!(h.service.history("s").await.is_empty());
}

#[tokio::test]
async fn test_history_window_limits_prompt_not_storage() {
    let mut config = test_config();
    config.chat.history_window = 2;
    let h = harness_with(
        config,
        MockCompletion::new("reply"),
        KeywordEmbedder::new(),
        MemoryFeedbackSink::default(),
    )
    .await;
    let session = Some("w".to_string());

    for question in ["one", "two", "three"] {
        h.service.respond(session.clone(), question, false).await;
    }

    let prompt = h.completion.last_prompt().unwrap();
    assert_eq!(prompt.len(), 3);
    assert_eq!(prompt[1].role, MessageRole::Assistant);
    assert_eq!(prompt[2].content, "three");
    assert_eq!(h.service.history("w").await.len(), 6);
}

#[tokio::test]
async fn test_concurrent_requests_on_one_session_stay_paired() {
    let h = harness(MockCompletion::new("reply")).await;

    let requests = (0..5).map(|i| {
        let service = h.service.clone();
        async move {
            service
                .respond(Some("shared".to_string()), &format!("question {}", i), false)
                .await
        }
    });
    futures::future::join_all(requests).await;

    let history = h.service.history("shared").await;
    assert_eq!(history.len(), 10);
    for pair in history.chunks(2) {
        assert_eq!(pair[0].role, MessageRole::User);
        assert_eq!(pair[1].role, MessageRole::Assistant);
    }
}

#[tokio::test]
async fn test_ingestion_is_idempotent() {
    let h = harness(MockCompletion::new("")).await;

    let first = h.service.initialize_data().await.unwrap();
    assert!(!first.skipped);
    assert_eq!(first.documents, 3);
    assert_eq!(first.indexed, 3);

    let second = h.service.initialize_data().await.unwrap();
    assert!(second.skipped);
    assert_eq!(h.index.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_reindex_rebuilds_index() {
    let h = indexed_harness(MockCompletion::new("")).await;

    let report = h.service.reindex().await.unwrap();

    assert!(!report.skipped);
    assert_eq!(report.indexed, 3);
    assert_eq!(h.index.count().await.unwrap(), 3);
}

#[rstest]
#[case("budget", "Annual Budget")]
#[case("how do I contact the office", "Contact the Office")]
#[case("river energy", "River Energy Project")]
#[tokio::test]
async fn test_search_ranks_best_match_first(#[case] query: &str, #[case] expected_title: &str) {
    let h = indexed_harness(MockCompletion::new("")).await;

    let results = h.service.search_documents(query, Some(2)).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title(), expected_title);
    assert_eq!(results[0].rank, 1);
    assert_eq!(results[1].rank, 2);
    assert!(results[0].similarity_score >= results[1].similarity_score);
}

#[tokio::test]
async fn test_search_uses_configured_default_k() {
    let mut config = test_config();
    config.rag.search_k = 1;
    let h = harness_with(
        config,
        MockCompletion::new(""),
        KeywordEmbedder::new(),
        MemoryFeedbackSink::default(),
    )
    .await;
    h.service.initialize_data().await.unwrap();

    let results = h.service.search_documents("budget", None).await.unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_search_surfaces_provider_errors() {
    let h = harness_with(
        test_config(),
        MockCompletion::new(""),
        KeywordEmbedder::failing(),
        MemoryFeedbackSink::default(),
    )
    .await;

    assert!(h.service.search_documents("budget", None).await.is_err());
}

#[tokio::test]
async fn test_clear_history_and_system_info() {
    let h = indexed_harness(MockCompletion::new("reply")).await;
    h.service.respond(Some("s".to_string()), "hello", false).await;

    let info = h.service.system_info(Some("s")).await;
    assert_eq!(info.conversation_length, 2);
    assert_eq!(info.model_name, "mock-model");
    assert_eq!(info.vector_store_stats.unwrap().total_entries, 3);

    h.service.clear_history("s").await;
    assert!(h.service.history("s").await.is_empty());
    assert_eq!(h.service.system_info(Some("s")).await.conversation_length, 0);
    assert_eq!(h.service.system_info(None).await.conversation_length, 0);
}

#[tokio::test]
async fn test_feedback_is_forwarded_to_sink() {
    let h = harness(MockCompletion::new("")).await;

    let accepted = h
        .service
        .submit_feedback(FeedbackInput {
            user_message: "q".into(),
            assistant_response: "a".into(),
            rating: 4,
            comments: "useful".into(),
            helpful: true,
        })
        .await;

    assert!(accepted);
    let records = h.feedback.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].rating, 4);
    assert!(records[0].helpful);
}

#[tokio::test]
async fn test_feedback_sink_failure_is_reported() {
    let h = harness_with(
        test_config(),
        MockCompletion::new(""),
        KeywordEmbedder::new(),
        MemoryFeedbackSink::failing(),
    )
    .await;

    assert!(!h.service.submit_feedback(FeedbackInput::default()).await);
}
