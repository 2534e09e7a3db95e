use crate::api::handlers::{chat, feedback, rag};
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Routes under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/search", post(rag::search))
        .route(
            "/sessions/{session_id}/history",
            get(chat::get_history).delete(chat::clear_history),
        )
        .route("/info", get(chat::system_info))
        .route("/suggestions", get(chat::suggestions))
        .route("/feedback", post(feedback::submit_feedback))
}

/// Full application router with tracing and CORS.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(rag::health))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
