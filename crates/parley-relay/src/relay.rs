//! Per-request relay pipeline.
//!
//! Each chat turn runs as two tasks. The pump opens the upstream stream,
//! translates it, and writes frames into a bounded channel. The supervisor
//! enforces the relay budget, turns a pump panic into an `error` event, and
//! owns the last channel sender: the downstream body ends exactly when the
//! supervisor returns.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::Stream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use parley_core::models::downstream::DownstreamEvent;
use parley_orchestrator::client::OrchestratorClient;
use parley_orchestrator::error::OrchestratorError;
use parley_orchestrator::stream::StreamAnswerRequest;
use parley_orchestrator::translate::Translator;

/// Outer execution budget for one turn. The orchestrator's own stream
/// timeout is shorter, so an upstream hang surfaces as an upstream error
/// before this fires.
pub const RELAY_BUDGET: Duration = Duration::from_secs(60);

/// Status sent before the upstream call is even opened.
pub const THINKING: &str = "thinking";

pub const NO_ANSWER: &str = "orchestrator stream ended without an answer";
pub const PUMP_FAILED: &str = "relay failed unexpectedly";
pub const BUDGET_EXCEEDED: &str = "relay budget exceeded";

/// Frames buffered between the pump and the response body.
pub const CHANNEL_CAPACITY: usize = 16;

/// One chat turn's correlation identifiers and question.
#[derive(Debug, Clone)]
pub struct Turn {
    pub session_id: String,
    pub request_id: String,
    pub question: String,
}

impl Turn {
    pub fn new(question: String) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            request_id: Uuid::new_v4().to_string(),
            question,
        }
    }

    fn request(&self) -> StreamAnswerRequest {
        StreamAnswerRequest {
            session_id: self.session_id.clone(),
            request_id: self.request_id.clone(),
            question: self.question.clone(),
        }
    }
}

/// Write side of the downstream stream.
///
/// Lets through at most one terminal event; anything sent after it is
/// dropped. A terminal event is claimed before it is sent and counts as
/// delivered only once it is in the channel.
#[derive(Debug, Clone)]
pub struct FrameSink {
    tx: mpsc::Sender<String>,
    claimed: Arc<AtomicBool>,
    delivered: Arc<AtomicBool>,
}

impl FrameSink {
    /// Encode and send one event. Returns `false` once the client is gone.
    pub async fn send(&self, event: &DownstreamEvent) -> bool {
        if self.claimed.load(Ordering::SeqCst) {
            debug!(event = event.name(), "dropping event after terminal");
            return !self.tx.is_closed();
        }
        if !event.is_terminal() {
            return self.tx.send(event.to_frame()).await.is_ok();
        }
        if self.claimed.swap(true, Ordering::SeqCst) {
            return !self.tx.is_closed();
        }
        self.deliver_terminal(event).await
    }

    /// Send a terminal event unless one has already been delivered, even if
    /// a sender that claimed the terminal slot was stopped before delivering.
    /// Only valid once no other sender is running.
    async fn send_final(&self, event: &DownstreamEvent) -> bool {
        if self.delivered.load(Ordering::SeqCst) {
            return !self.tx.is_closed();
        }
        self.claimed.store(true, Ordering::SeqCst);
        self.deliver_terminal(event).await
    }

    async fn deliver_terminal(&self, event: &DownstreamEvent) -> bool {
        let sent = self.tx.send(event.to_frame()).await.is_ok();
        if sent {
            self.delivered.store(true, Ordering::SeqCst);
        }
        sent
    }

    /// Resolves when the client has dropped the response body.
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    pub fn is_terminated(&self) -> bool {
        self.delivered.load(Ordering::SeqCst)
    }
}

/// Start relaying `turn` and return the downstream frame stream.
pub fn spawn(
    client: OrchestratorClient,
    turn: Turn,
) -> impl Stream<Item = Result<String, Infallible>> + Send + 'static {
    relay_stream(RELAY_BUDGET, move |sink| pump(client, turn, sink))
}

/// Run `pump` under supervision and expose what it sends as a stream.
pub fn relay_stream<F, Fut>(
    budget: Duration,
    pump: F,
) -> impl Stream<Item = Result<String, Infallible>> + Send + 'static
where
    F: FnOnce(FrameSink) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let sink = FrameSink {
        tx,
        claimed: Arc::new(AtomicBool::new(false)),
        delivered: Arc::new(AtomicBool::new(false)),
    };

    let task = tokio::spawn(pump(sink.clone()));
    tokio::spawn(supervise(sink, budget, task));

    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|frame| (Ok(frame), rx))
    })
}

async fn supervise(sink: FrameSink, budget: Duration, mut task: tokio::task::JoinHandle<()>) {
    match tokio::time::timeout(budget, &mut task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) if e.is_panic() => {
            error!("relay pump panicked");
            sink.send_final(&DownstreamEvent::Error(PUMP_FAILED.to_string())).await;
        }
        Ok(Err(_)) => debug!("relay pump cancelled"),
        Err(_) => {
            task.abort();
            let _ = task.await;
            warn!(budget_secs = budget.as_secs(), "relay budget exceeded");
            sink.send_final(&DownstreamEvent::Error(BUDGET_EXCEEDED.to_string())).await;
        }
    }
    // Dropping the last sender here closes the downstream body.
}

enum Forwarded {
    Drained,
    Disconnected,
}

async fn pump(client: OrchestratorClient, turn: Turn, sink: FrameSink) {
    if !sink.send(&DownstreamEvent::Status(THINKING.to_string())).await {
        return;
    }

    let mut translator = Translator::new(turn.request_id.as_str());

    match forward(&client, &turn, &mut translator, &sink).await {
        Ok(Forwarded::Disconnected) => {
            info!(request_id = %turn.request_id, "client disconnected");
        }
        Ok(Forwarded::Drained) if translator.is_finished() => {
            info!(request_id = %turn.request_id, "turn complete");
        }
        Ok(Forwarded::Drained) => {
            warn!(request_id = %turn.request_id, "{}", NO_ANSWER);
            sink.send(&DownstreamEvent::Error(NO_ANSWER.to_string())).await;
        }
        Err(e) => {
            warn!(request_id = %turn.request_id, error = %e, "orchestrator stream failed");
            sink.send(&translator.error(&e)).await;
        }
    }
}

async fn forward(
    client: &OrchestratorClient,
    turn: &Turn,
    translator: &mut Translator,
    sink: &FrameSink,
) -> Result<Forwarded, OrchestratorError> {
    let request = turn.request();
    let mut upstream = tokio::select! {
        _ = sink.closed() => return Ok(Forwarded::Disconnected),
        opened = client.stream_answer(&request) => opened?,
    };

    loop {
        let next = tokio::select! {
            _ = sink.closed() => return Ok(Forwarded::Disconnected),
            next = upstream.next_event() => next?,
        };
        let Some(event) = next else {
            return Ok(Forwarded::Drained);
        };
        if let Some(down) = translator.translate(event)
            && !sink.send(&down).await
        {
            return Ok(Forwarded::Disconnected);
        }
    }
}
