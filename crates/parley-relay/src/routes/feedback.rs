use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Serialize;

use parley_core::feedback::FeedbackSubmission;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
}

/// Validate a thumbs-up/down submission and forward it to the orchestrator.
pub async fn submit_feedback(
    State(state): State<AppState>,
    payload: Result<Json<FeedbackSubmission>, JsonRejection>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let Json(submission) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let feedback = submission.into_orchestrator()?;

    state.orchestrator.submit_feedback(&feedback).await?;

    Ok(Json(FeedbackResponse { success: true }))
}
