use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::ApiError;
use crate::relay::{self, Turn};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// Relay one user message to the orchestrator as an event stream.
///
/// The request is validated before anything is opened; after that the
/// response is always `200 text/event-stream` and failures arrive as an
/// `error` event inside the stream.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let message = payload
        .ok()
        .and_then(|Json(req)| req.message)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing message".to_string()))?;

    let turn = Turn::new(message);
    tracing::info!(
        session_id = %turn.session_id,
        request_id = %turn.request_id,
        "chat turn started"
    );

    let body = Body::from_stream(relay::spawn(state.orchestrator.clone(), turn));

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response())
}
