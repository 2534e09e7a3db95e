//! Document search and service health.

use crate::{
    types::{AppError, HealthResponse, Result, SearchRequest, SearchResponse},
    AppState,
};
use axum::{extract::State, Json};
use tracing::warn;

/// Largest `k` accepted by the search endpoint.
pub const MAX_SEARCH_K: usize = 50;

pub async fn search(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    if payload.query.trim().is_empty() {
        return Err(AppError::InvalidInput("query must not be empty".into()));
    }
    if payload.k == Some(0) || payload.k.is_some_and(|k| k > MAX_SEARCH_K) {
        return Err(AppError::InvalidInput(format!(
            "k must be between 1 and {}",
            MAX_SEARCH_K
        )));
    }

    let results = state.chat.search_documents(&payload.query, payload.k).await?;
    Ok(Json(SearchResponse {
        query: payload.query,
        results,
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let indexed_chunks = match state.chat.index().count().await {
        Ok(count) => count,
        Err(e) => {
            warn!(error = %e, "Health check could not count index entries");
            0
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        indexed_chunks,
    })
}
