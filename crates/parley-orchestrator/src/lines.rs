//! Upstream line framing: one `data: <json>` line per event, no blank-line
//! terminator. Anything that is not a `data:` line carrying a JSON object
//! with a string `type` is skipped.

use parley_core::models::upstream::UpstreamEvent;
use serde_json::Value;

#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return the events on every line it completed.
    /// A trailing partial line is kept for the next chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<UpstreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let Some(last_newline) = self.buffer.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let events = self.buffer[..last_newline]
            .split(|&b| b == b'\n')
            .filter_map(parse_line)
            .collect();
        self.buffer.drain(..=last_newline);
        events
    }

    /// Try whatever is left at end of stream as one last line.
    pub fn finish(&mut self) -> Option<UpstreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

pub fn parse_line(line: &[u8]) -> Option<UpstreamEvent> {
    let line = String::from_utf8_lossy(line);
    let payload = line.trim().strip_prefix("data:")?.trim();
    let value: Value = serde_json::from_str(payload).ok()?;
    UpstreamEvent::from_value(value)
}
