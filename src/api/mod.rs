//! HTTP API Handlers and Routes
//!
//! REST layer built on Axum.
//!
//! # API Endpoints
//!
//! - `GET /health` - Liveness plus indexed chunk count
//! - `POST /api/chat` - Ask a question within a session
//! - `POST /api/search` - Ranked passages for a query
//! - `GET /api/sessions/{id}/history` - Full session history
//! - `DELETE /api/sessions/{id}/history` - Clear a session
//! - `GET /api/info?session_id=` - Model settings and index statistics
//! - `GET /api/suggestions` - Suggested starter questions
//! - `POST /api/feedback` - Rate an answer
//!
//! Errors are returned as `{"error": "<message>"}` with a matching status code.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

pub use routes::create_router;
