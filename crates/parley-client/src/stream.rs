//! HTTP side of the chat client: opening a relay turn and reading its
//! event stream, plus feedback submission.

use std::collections::VecDeque;

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use parley_core::feedback::FeedbackSubmission;
use parley_core::models::downstream::DownstreamEvent;
use parley_core::sse::FrameDecoder;

use crate::error::ClientError;

/// Client for the relay's `/api/chat` and `/api/feedback` endpoints.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
}

/// What the relay answered a chat turn with.
#[derive(Debug)]
pub enum RelayResponse {
    Stream(RelayStream),
    /// A relay that answers with plain JSON `{response}` instead of events.
    Complete(Option<String>),
}

#[derive(Debug, Deserialize)]
struct CompleteReply {
    response: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorReply {
    error: Option<String>,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("parley-chat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Client(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one chat message.
    ///
    /// A connection failure on the first attempt is retried once; if that
    /// also fails the result is [`ClientError::Network`].
    pub async fn send_message(&self, message: &str) -> Result<RelayResponse, ClientError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = json!({ "message": message });

        let response = match self.http.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(e) if e.is_connect() => {
                warn!(error = %e, "relay unreachable, retrying once");
                self.http
                    .post(&url)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "relay retry failed");
                        ClientError::Network
                    })?
            }
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "relay refused chat request");
            return Err(ClientError::RequestFailed(status.as_u16()));
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        if is_json {
            let reply: CompleteReply = response.json().await?;
            return Ok(RelayResponse::Complete(reply.response));
        }

        Ok(RelayResponse::Stream(RelayStream {
            response,
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            done: false,
        }))
    }

    pub async fn submit_feedback(&self, submission: &FeedbackSubmission) -> Result<(), ClientError> {
        let url = format!("{}/api/feedback", self.base_url);
        let response = self.http.post(&url).json(submission).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reply: ErrorReply = serde_json::from_str(&body).unwrap_or_default();
            return Err(ClientError::Feedback(
                reply.error.unwrap_or_else(|| status.to_string()),
            ));
        }
        debug!(run_id = ?submission.run_id, "feedback accepted");
        Ok(())
    }
}

/// Events of one relay turn, decoded as they arrive.
#[derive(Debug)]
pub struct RelayStream {
    response: reqwest::Response,
    decoder: FrameDecoder,
    pending: VecDeque<DownstreamEvent>,
    done: bool,
}

impl RelayStream {
    /// Next event, or `Ok(None)` when the relay closes the stream. Frames
    /// with unknown event names are skipped.
    pub async fn next_event(&mut self) -> Result<Option<DownstreamEvent>, ClientError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            if self.done {
                return Ok(None);
            }

            match self.response.chunk().await? {
                Some(bytes) => {
                    let frames = self.decoder.push(&bytes);
                    self.pending
                        .extend(frames.into_iter().filter_map(DownstreamEvent::from_frame));
                }
                None => {
                    self.done = true;
                    self.pending
                        .extend(self.decoder.finish().and_then(DownstreamEvent::from_frame));
                }
            }
        }
    }
}
