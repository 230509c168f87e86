use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use parley_core::models::upstream::UpstreamEvent;

use crate::client::OrchestratorClient;
use crate::error::OrchestratorError;
use crate::lines::LineDecoder;

/// Body of `POST /orchestrator/stream-answer`.
#[derive(Debug, Clone, Serialize)]
pub struct StreamAnswerRequest {
    pub session_id: String,
    pub request_id: String,
    pub question: String,
}

/// An open answer stream. Dropping it closes the connection, which cancels
/// the upstream request.
#[derive(Debug)]
pub struct UpstreamStream {
    response: reqwest::Response,
    decoder: LineDecoder,
    pending: VecDeque<UpstreamEvent>,
    bytes_read: usize,
    done: bool,
    timeout: Duration,
}

impl OrchestratorClient {
    /// Open the streaming answer call.
    ///
    /// Makes exactly one attempt. A non-success status is returned as
    /// [`OrchestratorError::Status`] carrying the response body.
    pub async fn stream_answer(
        &self,
        req: &StreamAnswerRequest,
    ) -> Result<UpstreamStream, OrchestratorError> {
        let url = self.config.stream_answer_url();
        let timeout = self.config.stream_timeout;
        debug!(%url, request_id = %req.request_id, "opening orchestrator stream");

        let response = self
            .http
            .post(&url)
            .json(req)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| OrchestratorError::from_reqwest(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), request_id = %req.request_id, "orchestrator refused stream");
            return Err(OrchestratorError::status(status, body));
        }

        Ok(UpstreamStream {
            response,
            decoder: LineDecoder::new(),
            pending: VecDeque::new(),
            bytes_read: 0,
            done: false,
            timeout,
        })
    }
}

impl UpstreamStream {
    /// Next decoded event, or `Ok(None)` once the body is exhausted.
    ///
    /// A body that ends without a single byte is reported as
    /// [`OrchestratorError::EmptyBody`].
    pub async fn next_event(&mut self) -> Result<Option<UpstreamEvent>, OrchestratorError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            if self.done {
                return Ok(None);
            }

            let chunk = self
                .response
                .chunk()
                .await
                .map_err(|e| OrchestratorError::from_reqwest(e, self.timeout))?;

            match chunk {
                Some(bytes) => {
                    self.bytes_read += bytes.len();
                    self.pending.extend(self.decoder.push(&bytes));
                }
                None => {
                    self.done = true;
                    if self.bytes_read == 0 {
                        return Err(OrchestratorError::EmptyBody);
                    }
                    self.pending.extend(self.decoder.finish());
                }
            }
        }
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }
}
