use crate::{
    types::{AppError, FeedbackInput, FeedbackResponse, Result},
    AppState,
};
use axum::{extract::State, Json};

/// Record feedback on an answer. Storage failures report `accepted: false`.
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(payload): Json<FeedbackInput>,
) -> Result<Json<FeedbackResponse>> {
    if !(0..=5).contains(&payload.rating) {
        return Err(AppError::InvalidInput("rating must be between 0 and 5".into()));
    }

    let accepted = state.chat.submit_feedback(payload).await;
    Ok(Json(FeedbackResponse { accepted }))
}
