use tracing::{info, warn};
use uuid::Uuid;

use parley_core::feedback::{FeedbackSubmission, Rating, ThumbsDownReason};

use crate::consumer::{Applied, ChatState, SharedState, lock};
use crate::error::ClientError;
use crate::reveal::Typewriter;
use crate::stream::{RelayClient, RelayResponse};

/// One conversation with the relay: transcript, reveal and feedback.
pub struct ChatSession {
    client: RelayClient,
    state: SharedState,
    typewriter: Typewriter,
}

impl ChatSession {
    pub fn new(client: RelayClient) -> Self {
        let state = ChatState::new().shared();
        let typewriter = Typewriter::new(SharedState::clone(&state));
        Self {
            client,
            state,
            typewriter,
        }
    }

    /// Use a preconfigured typewriter, e.g. with different timing.
    pub fn with_typewriter(client: RelayClient, state: SharedState, typewriter: Typewriter) -> Self {
        Self {
            client,
            state,
            typewriter,
        }
    }

    pub fn state(&self) -> SharedState {
        SharedState::clone(&self.state)
    }

    pub fn snapshot(&self) -> ChatState {
        lock(&self.state).clone()
    }

    /// Run one chat turn. Returns `false` if the message was ignored
    /// because it is blank or a turn is already in progress.
    pub async fn send(&mut self, message: &str) -> bool {
        let text = message.trim();
        if text.is_empty() {
            return false;
        }
        {
            let mut state = lock(&self.state);
            if state.is_loading() {
                return false;
            }
            state.begin_turn(text);
        }
        self.typewriter.cancel();

        if let Err(e) = self.run_turn(text).await {
            warn!(error = %e, "chat turn failed");
            lock(&self.state).fail_turn(&e.to_string());
        }
        lock(&self.state).finish_turn();
        true
    }

    async fn run_turn(&mut self, text: &str) -> Result<(), ClientError> {
        match self.client.send_message(text).await? {
            RelayResponse::Complete(Some(answer)) => {
                lock(&self.state).push_answer(answer);
            }
            RelayResponse::Complete(None) => {}
            RelayResponse::Stream(mut stream) => {
                while let Some(event) = stream.next_event().await? {
                    let applied = lock(&self.state).apply(event);
                    if let Applied::RevealStarted(id) = applied {
                        self.typewriter.start(id);
                    }
                }
            }
        }
        Ok(())
    }

    /// Wait for the current reveal to finish.
    pub async fn wait_for_reveal(&mut self) {
        self.typewriter.wait().await;
    }

    pub fn is_revealing(&self) -> bool {
        self.typewriter.is_running()
    }

    pub async fn thumbs_up(&mut self, message_id: Uuid) -> Result<(), ClientError> {
        let Some(run_id) = self.run_id(message_id) else {
            return Ok(());
        };
        let submission = FeedbackSubmission {
            run_id: Some(run_id),
            feedback_type: Some(Rating::ThumbsUp.as_str().to_string()),
            ..Default::default()
        };
        self.client.submit_feedback(&submission).await?;
        lock(&self.state).mark_feedback(message_id, Rating::ThumbsUp);
        info!(%message_id, "thumbs up sent");
        Ok(())
    }

    pub async fn thumbs_down(
        &mut self,
        message_id: Uuid,
        reason: ThumbsDownReason,
        comment: Option<&str>,
    ) -> Result<(), ClientError> {
        let Some(run_id) = self.run_id(message_id) else {
            return Ok(());
        };
        let question = lock(&self.state)
            .question_for(message_id)
            .map(str::to_string);
        let submission = FeedbackSubmission {
            run_id: Some(run_id),
            feedback_type: Some(Rating::ThumbsDown.as_str().to_string()),
            reason: Some(reason.as_str().to_string()),
            question,
            comment: comment
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        };
        self.client.submit_feedback(&submission).await?;
        lock(&self.state).mark_feedback(message_id, Rating::ThumbsDown);
        info!(%message_id, reason = reason.as_str(), "thumbs down sent");
        Ok(())
    }

    /// Remove the last answer and its question; returns the question so
    /// the caller can send it again.
    pub fn regenerate(&mut self, message_id: Uuid) -> Option<String> {
        let question = lock(&self.state).regenerate(message_id)?;
        self.typewriter.cancel();
        Some(question)
    }

    fn run_id(&self, message_id: Uuid) -> Option<String> {
        lock(&self.state)
            .message(message_id)
            .and_then(|m| m.run_id.clone())
    }
}
