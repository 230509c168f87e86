use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// One event emitted by the orchestrator's answer stream.
///
/// The orchestrator's vocabulary is open-ended: anything whose `type` is not
/// recognised lands in [`UpstreamEvent::Unknown`] instead of failing to parse.
/// Every field other than `type` is optional, and a field with the wrong JSON
/// type is treated as absent.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamEvent {
    /// Progress report, e.g. `{"type":"state","phase":"thinking","message":"..."}`.
    State {
        phase: Option<String>,
        message: Option<String>,
    },
    /// The orchestrator's reinterpretation of the user's question.
    Rewrite { text: Option<String> },
    /// Which internal route the orchestrator picked. Informational only.
    Route { route: Option<String> },
    /// The final answer. `run_id` identifies the run for later feedback.
    Answer {
        text: Option<String>,
        run_id: Option<String>,
    },
    Unknown {
        kind: String,
        fields: Map<String, Value>,
    },
}

impl UpstreamEvent {
    /// Build an event from a decoded JSON value.
    ///
    /// Returns `None` when the value is not an object or has no string `type`.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut fields) = value else {
            return None;
        };
        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            _ => return None,
        };

        let event = match kind.as_str() {
            "state" => UpstreamEvent::State {
                phase: take_string(&mut fields, "phase"),
                message: take_string(&mut fields, "message"),
            },
            "rewrite" => UpstreamEvent::Rewrite {
                text: take_string(&mut fields, "text"),
            },
            "route" => UpstreamEvent::Route {
                route: take_string(&mut fields, "route"),
            },
            "answer" => UpstreamEvent::Answer {
                text: take_string(&mut fields, "text"),
                run_id: take_string(&mut fields, "agent_graph_run_id")
                    .or_else(|| take_string(&mut fields, "run_id")),
            },
            _ => UpstreamEvent::Unknown { kind, fields },
        };
        Some(event)
    }

    /// The raw `type` tag this event was parsed from.
    pub fn kind(&self) -> &str {
        match self {
            UpstreamEvent::State { .. } => "state",
            UpstreamEvent::Rewrite { .. } => "rewrite",
            UpstreamEvent::Route { .. } => "route",
            UpstreamEvent::Answer { .. } => "answer",
            UpstreamEvent::Unknown { kind, .. } => kind,
        }
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for UpstreamEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        UpstreamEvent::from_value(value)
            .ok_or_else(|| serde::de::Error::custom("event must be an object with a string `type`"))
    }
}
