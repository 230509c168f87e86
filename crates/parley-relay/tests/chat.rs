//! `/api/chat` end to end against an in-process fake orchestrator.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::routing::post;
use axum::Json;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use parley_core::models::downstream::{ChatResult, DownstreamEvent};
use parley_core::sse::FrameDecoder;
use parley_orchestrator::client::OrchestratorClient;
use parley_orchestrator::config::OrchestratorConfig;
use parley_relay::relay::{NO_ANSWER, THINKING};
use parley_relay::state::AppState;

const UNREACHABLE: &str = "http://127.0.0.1:9";

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn relay(base_url: &str) -> Router {
    let orchestrator = OrchestratorClient::new(OrchestratorConfig::new(base_url)).unwrap();
    parley_relay::app(AppState { orchestrator })
}

fn fake_orchestrator(body: &'static str) -> Router {
    Router::new().route("/orchestrator/stream-answer", post(move || async move { body }))
}

struct Reply {
    status: StatusCode,
    content_type: String,
    body: Vec<u8>,
}

async fn post_chat(app: Router, body: &str) -> Reply {
    let req = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let content_type = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    Reply {
        status,
        content_type,
        body,
    }
}

fn events(body: &[u8]) -> Vec<DownstreamEvent> {
    let mut decoder = FrameDecoder::new();
    let mut frames = decoder.push(body);
    frames.extend(decoder.finish());
    frames
        .into_iter()
        .filter_map(DownstreamEvent::from_frame)
        .collect()
}

fn thinking() -> DownstreamEvent {
    DownstreamEvent::Status(THINKING.to_string())
}

#[tokio::test]
async fn invalid_requests_are_rejected_without_streaming() {
    for body in [r#"{}"#, r#"{"message": 5}"#, r#"{"message": ""}"#, "not json"] {
        let reply = post_chat(relay(UNREACHABLE), body).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "body {body}");
        let json: Value = serde_json::from_slice(&reply.body).unwrap();
        assert_eq!(json, json!({ "error": "Missing message" }));
    }
}

#[tokio::test]
async fn relays_status_rewrite_and_answer() {
    let base = spawn(fake_orchestrator(concat!(
        "data: {\"type\":\"state\",\"phase\":\"searching\",\"message\":\"Searching SQL…\"}\n",
        "data: {\"type\":\"route\",\"route\":\"sql\"}\n",
        "data: {\"type\":\"rewrite\",\"text\":\"Q?\"}\n",
        "data: {\"type\":\"state\",\"phase\":\"done\",\"message\":\"done\"}\n",
        "data: {\"type\":\"answer\",\"text\":\"A.\",\"agent_graph_run_id\":\"r1\"}\n",
    )))
    .await;

    let reply = post_chat(relay(&base), r#"{"message":"which jobs pay best?"}"#).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.content_type, "text/event-stream");
    assert_eq!(
        events(&reply.body),
        vec![
            thinking(),
            DownstreamEvent::Status("Searching SQL…".to_string()),
            DownstreamEvent::Result(ChatResult {
                rewrite: Some("Q?".to_string()),
                response: "A.".to_string(),
                run_id: "r1".to_string(),
            }),
        ]
    );
}

#[tokio::test]
async fn run_id_defaults_to_the_forwarded_request_id() {
    let app = Router::new().route(
        "/orchestrator/stream-answer",
        post(|Json(req): Json<Value>| async move {
            let rewrite = json!({ "type": "rewrite", "text": req["request_id"] });
            let answer = json!({ "type": "answer", "text": req["question"] });
            format!("data: {rewrite}\ndata: {answer}\n")
        }),
    );
    let base = spawn(app).await;

    let reply = post_chat(relay(&base), r#"{"message":"echo me"}"#).await;
    let events = events(&reply.body);
    let Some(DownstreamEvent::Result(result)) = events.last() else {
        panic!("expected a result, got {events:?}");
    };
    assert_eq!(result.response, "echo me");
    assert_eq!(result.rewrite.as_deref(), Some(result.run_id.as_str()));
    assert!(Uuid::parse_str(&result.run_id).is_ok());
}

#[tokio::test]
async fn upstream_failure_becomes_one_error_event() {
    let app = Router::new().route(
        "/orchestrator/stream-answer",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base = spawn(app).await;

    let reply = post_chat(relay(&base), r#"{"message":"q"}"#).await;
    assert_eq!(reply.status, StatusCode::OK);

    let events = events(&reply.body);
    assert_eq!(events.len(), 2, "{events:?}");
    assert_eq!(events[0], thinking());
    match &events[1] {
        DownstreamEvent::Error(msg) => {
            assert!(msg.contains("500"), "{msg}");
            assert!(msg.contains("boom"), "{msg}");
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn stream_without_answer_still_terminates() {
    let base = spawn(fake_orchestrator(
        "data: {\"type\":\"state\",\"phase\":\"thinking\",\"message\":\"hmm\"}\n",
    ))
    .await;

    let reply = post_chat(relay(&base), r#"{"message":"q"}"#).await;
    assert_eq!(
        events(&reply.body),
        vec![
            thinking(),
            DownstreamEvent::Status("hmm".to_string()),
            DownstreamEvent::Error(NO_ANSWER.to_string()),
        ]
    );
}

#[tokio::test]
async fn unreachable_orchestrator_is_reported_in_stream() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let reply = post_chat(relay(&format!("http://{addr}")), r#"{"message":"q"}"#).await;
    let events = events(&reply.body);
    assert_eq!(events.first(), Some(&thinking()));
    assert!(matches!(events.as_slice(), [_, DownstreamEvent::Error(_)]), "{events:?}");
}

#[tokio::test]
async fn malformed_upstream_lines_are_skipped() {
    let base = spawn(fake_orchestrator(concat!(
        "data: {oops\n",
        "data: {\"type\":\"answer\",\"text\":\"fine\"}\n",
    )))
    .await;

    let reply = post_chat(relay(&base), r#"{"message":"q"}"#).await;
    let events = events(&reply.body);
    assert!(
        matches!(events.as_slice(), [_, DownstreamEvent::Result(r)] if r.response == "fine"),
        "{events:?}"
    );
}
