use tracing::debug;

use parley_core::models::downstream::{ChatResult, DownstreamEvent};
use parley_core::models::upstream::UpstreamEvent;

use crate::error::OrchestratorError;

/// Phase reported by the orchestrator once it is done; carries nothing for
/// the user.
const DONE_PHASE: &str = "done";

/// Maps one request's upstream events onto the downstream vocabulary.
///
/// The only state carried between events is the most recent rewrite, which
/// is attached to the terminal `result`. Once that result has been
/// produced every further event is ignored.
#[derive(Debug)]
pub struct Translator {
    request_id: String,
    pending_rewrite: Option<String>,
    finished: bool,
}

impl Translator {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            pending_rewrite: None,
            finished: false,
        }
    }

    pub fn translate(&mut self, event: UpstreamEvent) -> Option<DownstreamEvent> {
        if self.finished {
            debug!(kind = event.kind(), "ignoring event after answer");
            return None;
        }

        match event {
            UpstreamEvent::State {
                phase: Some(phase),
                message: Some(message),
            } if phase != DONE_PHASE => {
                debug!(%phase, %message, "upstream status");
                Some(DownstreamEvent::Status(message))
            }
            UpstreamEvent::Rewrite { text: Some(text) } => {
                debug!(rewrite = %text, "upstream rewrite");
                self.pending_rewrite = Some(text);
                None
            }
            UpstreamEvent::Answer { text, run_id } => {
                let response = text.unwrap_or_default();
                let run_id = run_id.unwrap_or_else(|| self.request_id.clone());
                debug!(%run_id, len = response.len(), "upstream answer");
                self.finished = true;
                Some(DownstreamEvent::Result(ChatResult {
                    rewrite: self.pending_rewrite.take(),
                    response,
                    run_id,
                }))
            }
            _ => None,
        }
    }

    /// Downstream form of a failed upstream call.
    pub fn error(&self, err: &OrchestratorError) -> DownstreamEvent {
        DownstreamEvent::Error(err.to_string())
    }

    pub fn pending_rewrite(&self) -> Option<&str> {
        self.pending_rewrite.as_deref()
    }

    /// Whether the terminal `result` has been produced.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
