use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The relay could not be reached, even after the one retry.
    #[error("Network error. Check the server is running and try again.")]
    Network,

    #[error("Request failed")]
    RequestFailed(u16),

    #[error("feedback was not accepted: {0}")]
    Feedback(String),

    #[error("relay connection failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP client error: {0}")]
    Client(String),
}
