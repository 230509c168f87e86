//! Downstream event-stream framing.
//!
//! A frame is `event: <name>\ndata: <json>\n\n`. The data line always holds
//! compact single-line JSON, so a blank line only ever appears as a frame
//! terminator.
//!
//! This is deliberately not the framing the orchestrator speaks upstream
//! (one `data:` line per event, no blank-line terminator); that codec lives
//! in `parley-orchestrator`.

use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;

const TERMINATOR: &[u8] = b"\n\n";

/// One decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub event: String,
    pub data: Value,
}

/// Serialize `data` and wrap it in a frame named `event`.
pub fn encode_frame<T>(event: &str, data: &T) -> Result<String, CoreError>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(data)?;
    Ok(format!("event: {event}\ndata: {json}\n\n"))
}

/// Frame an already-built JSON value. Infallible.
pub fn encode_value(event: &str, data: &Value) -> String {
    format!("event: {event}\ndata: {data}\n\n")
}

/// Incremental frame decoder.
///
/// Bytes are buffered until a blank-line terminator completes a block; any
/// trailing partial block stays buffered for the next [`push`](Self::push).
/// Splitting happens on bytes, so a chunk boundary inside a multi-byte UTF-8
/// character is harmless. Blocks without an `event:` or `data:` line, or
/// whose data is not valid JSON, are dropped.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Offset up to which `buffer` is known not to contain a terminator.
    scanned: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        let mut search_from = self.scanned;

        while let Some(pos) = find_terminator(&self.buffer[search_from..]) {
            let end = search_from + pos;
            if let Some(frame) = parse_block(&self.buffer[start..end]) {
                frames.push(frame);
            }
            start = end + TERMINATOR.len();
            search_from = start;
        }

        self.buffer.drain(..start);
        // The last byte may be the first half of a terminator.
        self.scanned = self.buffer.len().saturating_sub(1);
        frames
    }

    /// Flush whatever is left at end of stream as one final block.
    pub fn finish(&mut self) -> Option<Frame> {
        self.scanned = 0;
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        parse_block(&rest)
    }

    /// Number of bytes held back waiting for a terminator.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn find_terminator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(TERMINATOR.len())
        .position(|w| w == TERMINATOR)
}

fn parse_block(block: &[u8]) -> Option<Frame> {
    let text = String::from_utf8_lossy(block);

    let event = text.lines().find_map(|line| {
        let rest = line.strip_prefix("event: ")?;
        let name_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        (name_len > 0).then(|| rest[..name_len].to_string())
    })?;

    let data = text
        .lines()
        .find_map(|line| line.strip_prefix("data: ").filter(|rest| !rest.is_empty()))?;

    let data = serde_json::from_str(data).ok()?;
    Some(Frame { event, data })
}
