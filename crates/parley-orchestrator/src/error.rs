use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Non-success HTTP status. `body` falls back to the canonical reason
    /// phrase when the orchestrator sent nothing.
    #[error("{status}: {body}")]
    Status { status: u16, body: String },

    #[error("No response body")]
    EmptyBody,

    #[error("orchestrator did not respond within {0:?}")]
    Timeout(Duration),

    #[error("orchestrator request failed: {0}")]
    Transport(String),

    #[error("orchestrator rejected the request: {0}")]
    Rejected(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl OrchestratorError {
    pub(crate) fn status(status: StatusCode, body: String) -> Self {
        let body = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or_default().to_string()
        } else {
            body
        };
        OrchestratorError::Status {
            status: status.as_u16(),
            body,
        }
    }

    pub(crate) fn from_reqwest(e: reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            OrchestratorError::Timeout(timeout)
        } else {
            OrchestratorError::Transport(e.to_string())
        }
    }
}
