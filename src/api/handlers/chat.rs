use crate::{
    types::{AppError, ChatRequest, ChatResponse, HistoryResponse, Result, SystemInfo},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

/// Answer a question. Provider failures still produce `200` with the
/// fallback answer and an `error` field.
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    if payload.message.trim().is_empty() {
        return Err(AppError::InvalidInput("message must not be empty".into()));
    }

    let response = state
        .chat
        .respond(
            payload.session_id,
            &payload.message,
            payload.use_context.unwrap_or(true),
        )
        .await;

    Ok(Json(response))
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<HistoryResponse> {
    let turns = state.chat.history(&session_id).await;
    Json(HistoryResponse { session_id, turns })
}

pub async fn clear_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> StatusCode {
    state.chat.clear_history(&session_id).await;
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
pub struct InfoQuery {
    pub session_id: Option<String>,
}

pub async fn system_info(
    State(state): State<AppState>,
    Query(query): Query<InfoQuery>,
) -> Json<SystemInfo> {
    Json(state.chat.system_info(query.session_id.as_deref()).await)
}

pub async fn suggestions(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.chat.suggested_questions().to_vec())
}
