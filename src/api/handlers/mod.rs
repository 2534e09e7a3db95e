//! API request handlers.

/// Chat, session history and system info handlers.
pub mod chat;
/// Feedback submission.
pub mod feedback;
/// Document search and health.
pub mod rag;
