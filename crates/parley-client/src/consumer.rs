//! Chat state and the state machine that applies relay events to it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use parley_core::feedback::Rating;
use parley_core::models::downstream::DownstreamEvent;
use uuid::Uuid;

use crate::models::ChatMessage;
use crate::reveal::Reveal;

/// Lead-in shown before the orchestrator's rewrite of the question.
pub const REWRITE_MARKER: &str = "I think your question is:";
pub const SECTION_SEPARATOR: &str = "\n\n";

pub type SharedState = Arc<Mutex<ChatState>>;

/// Lock shared chat state. A poisoned lock still holds consistent data
/// because every mutation completes under a single guard.
pub fn lock(state: &SharedState) -> MutexGuard<'_, ChatState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Outcome of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Updated,
    /// A new assistant message became the reveal target; start the typewriter.
    RevealStarted(Uuid),
}

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    messages: Vec<ChatMessage>,
    status: Option<String>,
    loading: bool,
    pub(crate) reveal: Option<Reveal>,
    feedback: HashMap<Uuid, Rating>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn reveal(&self) -> Option<Reveal> {
        self.reveal
    }

    pub fn message(&self, id: Uuid) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn feedback_for(&self, id: Uuid) -> Option<Rating> {
        self.feedback.get(&id).copied()
    }

    /// Append the user's message and enter the loading state.
    pub fn begin_turn(&mut self, text: impl Into<String>) -> Uuid {
        let message = ChatMessage::user(text);
        let id = message.id;
        self.messages.push(message);
        self.loading = true;
        self.status = None;
        self.reveal = None;
        id
    }

    pub fn finish_turn(&mut self) {
        self.loading = false;
        self.status = None;
    }

    /// Record a failed turn as an assistant message.
    pub fn fail_turn(&mut self, error: &str) {
        self.messages
            .push(ChatMessage::assistant(format!("Error: {error}"), None));
        self.finish_turn();
    }

    /// Append a complete answer without a reveal, as a non-streaming relay
    /// returns it.
    pub fn push_answer(&mut self, text: impl Into<String>) -> Uuid {
        let message = ChatMessage::assistant(text, None);
        let id = message.id;
        self.messages.push(message);
        id
    }

    pub fn apply(&mut self, event: DownstreamEvent) -> Applied {
        match event {
            DownstreamEvent::Status(text) => {
                self.status = Some(text);
                Applied::Updated
            }
            DownstreamEvent::ResultChunk { delta } => {
                if delta.is_empty() {
                    return Applied::Updated;
                }
                let target = self.reveal.map(|r| r.message_id);
                if let Some(last) = self.messages.last_mut()
                    && last.is_assistant()
                    && Some(last.id) == target
                {
                    last.content.push_str(&delta);
                    return Applied::Updated;
                }
                let message = ChatMessage::assistant(delta, None);
                let id = message.id;
                self.messages.push(message);
                self.reveal = Some(Reveal::new(id, 0));
                Applied::RevealStarted(id)
            }
            DownstreamEvent::Result(result) => {
                let prefix = match result.rewrite.as_deref().filter(|r| !r.is_empty()) {
                    Some(rewrite) => format!("{REWRITE_MARKER} {rewrite}{SECTION_SEPARATOR}"),
                    None => String::new(),
                };
                let prefix_len = prefix.chars().count();
                let run_id = Some(result.run_id).filter(|r| !r.is_empty());
                let message = ChatMessage::assistant(prefix + &result.response, run_id);
                let id = message.id;
                self.messages.push(message);
                self.reveal = Some(Reveal::new(id, prefix_len));
                self.finish_turn();
                Applied::RevealStarted(id)
            }
            DownstreamEvent::Error(text) => {
                self.fail_turn(&text);
                Applied::Updated
            }
        }
    }

    /// The text to render for a message right now.
    pub fn display_content<'a>(&self, message: &'a ChatMessage) -> &'a str {
        match self.reveal {
            Some(reveal) if reveal.message_id == message.id => {
                let shown = reveal.prefix_len + reveal.visible_len;
                let end = message
                    .content
                    .char_indices()
                    .nth(shown)
                    .map(|(i, _)| i)
                    .unwrap_or(message.content.len());
                &message.content[..end]
            }
            _ => &message.content,
        }
    }

    /// Copy, regenerate and feedback are offered once an answer is fully shown.
    pub fn actions_available(&self, id: Uuid) -> bool {
        let revealing = self.reveal.is_some_and(|r| r.message_id == id);
        !revealing && self.message(id).is_some_and(ChatMessage::is_assistant)
    }

    pub fn last_assistant_id(&self) -> Option<Uuid> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_assistant())
            .map(|m| m.id)
    }

    /// The user message an answer responds to.
    pub fn question_for(&self, id: Uuid) -> Option<&str> {
        let index = self.messages.iter().position(|m| m.id == id)?;
        let previous = self.messages.get(index.checked_sub(1)?)?;
        (!previous.is_assistant()).then_some(previous.content.as_str())
    }

    /// Drop the last answer and the question it answered, returning the
    /// question for resubmission. Only the last assistant message qualifies.
    pub fn regenerate(&mut self, id: Uuid) -> Option<String> {
        if self.loading || self.last_assistant_id() != Some(id) {
            return None;
        }
        let index = self.messages.iter().position(|m| m.id == id)?;
        let question = self.question_for(id)?.to_string();
        for removed in self.messages.drain(index - 1..) {
            self.feedback.remove(&removed.id);
        }
        if self.reveal.is_some_and(|r| r.message_id == id) {
            self.reveal = None;
        }
        Some(question)
    }

    /// Marks are exclusive: rating a message replaces its previous rating.
    pub fn mark_feedback(&mut self, id: Uuid, rating: Rating) {
        self.feedback.insert(id, rating);
    }
}

/// Human-readable text for a relay status.
pub fn status_label(status: &str) -> &str {
    match status {
        "thinking" => "Thinking...",
        "searching_sql" => "Searching SQL...",
        "cached" => "From cache...",
        "error" => "Error",
        other => other,
    }
}
