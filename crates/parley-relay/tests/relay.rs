//! Supervisor guarantees of the per-request relay pipeline.

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::oneshot;

use parley_core::models::downstream::{ChatResult, DownstreamEvent};
use parley_core::sse::FrameDecoder;
use parley_relay::relay::{BUDGET_EXCEEDED, CHANNEL_CAPACITY, PUMP_FAILED, relay_stream};

fn decode(frames: Vec<Result<String, std::convert::Infallible>>) -> Vec<DownstreamEvent> {
    let mut decoder = FrameDecoder::new();
    frames
        .into_iter()
        .flatten()
        .flat_map(|frame| decoder.push(frame.as_bytes()))
        .filter_map(DownstreamEvent::from_frame)
        .collect()
}

fn status(text: &str) -> DownstreamEvent {
    DownstreamEvent::Status(text.to_string())
}

#[tokio::test]
async fn panicking_pump_becomes_error_event() {
    let stream = relay_stream(Duration::from_secs(5), |sink| async move {
        sink.send(&status("thinking")).await;
        panic!("pump exploded");
    });

    let events = decode(stream.collect().await);
    assert_eq!(
        events,
        vec![status("thinking"), DownstreamEvent::Error(PUMP_FAILED.to_string())]
    );
}

#[tokio::test]
async fn exceeding_the_budget_reports_and_closes() {
    let stream = relay_stream(Duration::from_millis(50), |sink| async move {
        sink.send(&status("thinking")).await;
        std::future::pending::<()>().await;
    });

    let events = tokio::time::timeout(Duration::from_secs(5), stream.collect::<Vec<_>>())
        .await
        .expect("stream must close after the budget");
    assert_eq!(
        decode(events),
        vec![status("thinking"), DownstreamEvent::Error(BUDGET_EXCEEDED.to_string())]
    );
}

#[tokio::test]
async fn only_the_first_terminal_event_is_sent() {
    let result = DownstreamEvent::Result(ChatResult {
        rewrite: None,
        response: "A.".to_string(),
        run_id: "r1".to_string(),
    });
    let first = result.clone();

    let stream = relay_stream(Duration::from_secs(5), move |sink| async move {
        sink.send(&first).await;
        sink.send(&DownstreamEvent::Error("late".to_string())).await;
        sink.send(&status("late status")).await;
        assert!(sink.is_terminated());
    });

    assert_eq!(decode(stream.collect().await), vec![result]);
}

#[tokio::test]
async fn dropped_client_stops_the_pump() {
    let (done_tx, done_rx) = oneshot::channel();

    let mut stream = Box::pin(relay_stream(Duration::from_secs(5), |sink| async move {
        let mut sent = 0usize;
        while sink.send(&status("tick")).await {
            sent += 1;
            tokio::task::yield_now().await;
        }
        let _ = done_tx.send(sent);
    }));

    assert!(stream.next().await.is_some());
    drop(stream);

    let sent = tokio::time::timeout(Duration::from_secs(5), done_rx)
        .await
        .expect("pump must notice the disconnect")
        .unwrap();
    assert!(sent >= 1);
}

#[tokio::test]
async fn budget_error_replaces_a_terminal_stuck_on_a_full_channel() {
    let stream = relay_stream(Duration::from_millis(50), |sink| async move {
        for _ in 0..CHANNEL_CAPACITY {
            sink.send(&status("queued")).await;
        }
        sink.send(&DownstreamEvent::Result(ChatResult {
            rewrite: None,
            response: "too late".to_string(),
            run_id: "r1".to_string(),
        }))
        .await;
    });

    // Nobody reads until well past the budget, so the result never fits.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let frames = tokio::time::timeout(Duration::from_secs(5), stream.collect::<Vec<_>>())
        .await
        .expect("stream must close after the budget");

    let events = decode(frames);
    assert_eq!(events.len(), CHANNEL_CAPACITY + 1);
    assert!(events[..CHANNEL_CAPACITY].iter().all(|e| *e == status("queued")));
    assert_eq!(
        events[CHANNEL_CAPACITY],
        DownstreamEvent::Error(BUDGET_EXCEEDED.to_string())
    );
}
