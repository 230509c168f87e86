use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Missing {0}")]
    MissingField(String),

    #[error("feedback_type must be thumbs_up or thumbs_down")]
    InvalidFeedbackType(String),

    #[error("Invalid reason")]
    InvalidReason(String),
}
