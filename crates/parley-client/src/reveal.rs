//! Typewriter reveal of the latest answer.
//!
//! A reveal shows the rewrite prefix at once and then uncovers the answer a
//! few characters per tick. At most one reveal runs at a time; a timer that
//! has been superseded finds a different target in the state and stops
//! without touching it.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::debug;
use uuid::Uuid;

use crate::consumer::{ChatState, SharedState, lock};

pub const TICK_INTERVAL: Duration = Duration::from_millis(20);
pub const CHARS_PER_TICK: usize = 2;

/// Progress of the message currently being revealed.
///
/// Lengths are counted in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reveal {
    pub message_id: Uuid,
    pub prefix_len: usize,
    pub visible_len: usize,
}

impl Reveal {
    pub fn new(message_id: Uuid, prefix_len: usize) -> Self {
        Self {
            message_id,
            prefix_len,
            visible_len: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Advanced(usize),
    Finished,
    /// The message is no longer the reveal target.
    Stale,
}

impl ChatState {
    /// Chars of `message_id` still hidden, or `None` if it is not the target.
    pub fn remaining_reveal(&self, message_id: Uuid) -> Option<usize> {
        let reveal = self.reveal.filter(|r| r.message_id == message_id)?;
        let total = self.message(message_id)?.content.chars().count();
        let revealable = total.saturating_sub(reveal.prefix_len);
        Some(revealable.saturating_sub(reveal.visible_len))
    }

    pub fn advance_reveal(&mut self, message_id: Uuid, batch: usize) -> Tick {
        let Some(reveal) = self.reveal.filter(|r| r.message_id == message_id) else {
            return Tick::Stale;
        };
        let total = self
            .message(message_id)
            .map_or(0, |m| m.content.chars().count());
        let revealable = total.saturating_sub(reveal.prefix_len);
        let visible = (reveal.visible_len + batch).min(revealable);
        if visible >= revealable {
            self.reveal = None;
            return Tick::Finished;
        }
        self.reveal = Some(Reveal {
            visible_len: visible,
            ..reveal
        });
        Tick::Advanced(visible)
    }

    /// End the reveal of `message_id` now, showing the whole message.
    pub fn finish_reveal(&mut self, message_id: Uuid) {
        if self.reveal.is_some_and(|r| r.message_id == message_id) {
            self.reveal = None;
        }
    }
}

/// Drives the reveal timer. Owns at most one running timer task.
pub struct Typewriter {
    state: SharedState,
    interval: Duration,
    batch: usize,
    active: Option<JoinHandle<()>>,
}

impl Typewriter {
    pub fn new(state: SharedState) -> Self {
        Self::with_timing(state, TICK_INTERVAL, CHARS_PER_TICK)
    }

    pub fn with_timing(state: SharedState, interval: Duration, batch: usize) -> Self {
        Self {
            state,
            interval,
            batch: batch.max(1),
            active: None,
        }
    }

    /// Start revealing `message_id`, cancelling any reveal in progress.
    pub fn start(&mut self, message_id: Uuid) {
        self.cancel();

        let remaining = lock(&self.state).remaining_reveal(message_id);
        match remaining {
            None => return,
            Some(0) => {
                lock(&self.state).finish_reveal(message_id);
                return;
            }
            Some(_) => {}
        }

        let state = SharedState::clone(&self.state);
        let (period, batch) = (self.interval, self.batch);
        self.active = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let tick = lock(&state).advance_reveal(message_id, batch);
                match tick {
                    Tick::Advanced(_) => {}
                    Tick::Finished | Tick::Stale => {
                        debug!(%message_id, ?tick, "reveal ended");
                        break;
                    }
                }
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Wait for the running reveal, if any, to end.
    pub async fn wait(&mut self) {
        if let Some(handle) = self.active.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Typewriter {
    fn drop(&mut self) {
        self.cancel();
    }
}
