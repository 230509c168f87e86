use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::sse::{self, Frame};

pub const STATUS: &str = "status";
pub const RESULT: &str = "result";
pub const RESULT_CHUNK: &str = "result_chunk";
pub const ERROR: &str = "error";

/// Payload of the terminal `result` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResult {
    /// The orchestrator's rewrite of the question, if it produced one.
    pub rewrite: Option<String>,
    pub response: String,
    pub run_id: String,
}

/// An event in the simplified stream the relay sends to chat clients.
///
/// A well-formed stream carries zero or more `Status` events followed by
/// exactly one terminal event (`Result` or `Error`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownstreamEvent {
    Status(String),
    /// Incremental answer text. The relay does not produce these today, but
    /// clients accept them.
    ResultChunk { delta: String },
    Result(ChatResult),
    Error(String),
}

impl DownstreamEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DownstreamEvent::Status(_) => STATUS,
            DownstreamEvent::ResultChunk { .. } => RESULT_CHUNK,
            DownstreamEvent::Result(_) => RESULT,
            DownstreamEvent::Error(_) => ERROR,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DownstreamEvent::Result(_) | DownstreamEvent::Error(_))
    }

    pub fn payload(&self) -> Value {
        match self {
            DownstreamEvent::Status(text) | DownstreamEvent::Error(text) => json!(text),
            DownstreamEvent::ResultChunk { delta } => json!({ "delta": delta }),
            DownstreamEvent::Result(result) => json!({
                "rewrite": result.rewrite,
                "response": result.response,
                "run_id": result.run_id,
            }),
        }
    }

    /// Encode as one `event:`/`data:` frame.
    pub fn to_frame(&self) -> String {
        sse::encode_value(self.name(), &self.payload())
    }

    /// Interpret a decoded frame. Unknown event names yield `None`.
    ///
    /// Payloads are read leniently: a non-string status or error payload is
    /// kept as its JSON text, a non-string `response` likewise, and a
    /// non-string `rewrite` counts as absent.
    pub fn from_frame(frame: Frame) -> Option<Self> {
        let Frame { event, data } = frame;
        let event = match event.as_str() {
            STATUS => DownstreamEvent::Status(text_of(data)),
            ERROR => DownstreamEvent::Error(text_of(data)),
            RESULT_CHUNK => {
                let delta = data
                    .get("delta")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                DownstreamEvent::ResultChunk { delta }
            }
            RESULT => DownstreamEvent::Result(result_of(data)),
            _ => return None,
        };
        Some(event)
    }
}

fn text_of(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn result_of(data: Value) -> ChatResult {
    let Value::Object(mut obj) = data else {
        // A bare payload is the answer itself.
        return ChatResult {
            rewrite: None,
            response: text_of(data),
            run_id: String::new(),
        };
    };

    let response = match obj.remove("response") {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    let rewrite = match obj.remove("rewrite") {
        Some(Value::String(s)) => Some(s),
        _ => None,
    };
    let run_id = match obj.remove("run_id") {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };

    ChatResult {
        rewrite,
        response,
        run_id,
    }
}
