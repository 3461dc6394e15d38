//! Incremental decoding of OpenAI-compatible chat-completion event streams.
//!
//! The upstream body is newline-delimited server-sent events. Each line is a
//! comment (`:`), blank, or `data: <payload>` where the payload is either a
//! JSON chunk or the literal `[DONE]`. Only `choices[0].delta.content` is
//! collected.

use serde_json::Value;

pub const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// More input is expected.
    Continue,
    /// `[DONE]` was seen; further input is ignored.
    Done,
}

#[derive(Debug, PartialEq, Eq)]
enum LineOutcome {
    Consumed,
    Incomplete,
    Done,
}

/// Reassembles the assistant text from raw stream chunks.
///
/// Lines are split on raw bytes and decoded afterwards, so a multi-byte
/// character cut by a chunk boundary is still decoded correctly.
#[derive(Debug, Default)]
pub struct SseAssembler {
    buffer: Vec<u8>,
    content: String,
    done: bool,
}

impl SseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and processes every complete line it makes available.
    ///
    /// A complete `data:` line whose JSON payload does not parse stays at the
    /// head of the buffer and processing stops until the next chunk arrives.
    pub fn push(&mut self, chunk: &[u8]) -> Progress {
        if self.done {
            return Progress::Done;
        }
        self.buffer.extend_from_slice(chunk);

        let mut consumed = 0;
        while let Some(offset) = self.buffer[consumed..].iter().position(|b| *b == b'\n') {
            let end = consumed + offset;
            let line = String::from_utf8_lossy(&self.buffer[consumed..end]).into_owned();
            match self.apply_line(&line) {
                LineOutcome::Consumed => consumed = end + 1,
                LineOutcome::Incomplete => break,
                LineOutcome::Done => {
                    consumed = end + 1;
                    self.done = true;
                    break;
                }
            }
        }
        self.buffer.drain(..consumed);

        if self.done {
            self.buffer.clear();
            Progress::Done
        } else {
            Progress::Continue
        }
    }

    /// Text accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Bytes held back waiting for a line terminator or a parseable payload.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Ends the stream and returns the assembled text.
    ///
    /// Whatever is still buffered is treated as final lines. Payloads that
    /// still fail to parse are dropped; their size is returned alongside the
    /// text so the caller can report it.
    pub fn finish(mut self) -> Assembled {
        let mut discarded_bytes = 0;
        if !self.done && !self.buffer.is_empty() {
            let rest = String::from_utf8_lossy(&self.buffer).into_owned();
            for line in rest.split('\n') {
                match self.apply_line(line) {
                    LineOutcome::Consumed => {}
                    LineOutcome::Incomplete => discarded_bytes += line.len(),
                    LineOutcome::Done => break,
                }
            }
        }
        Assembled {
            content: self.content,
            discarded_bytes,
        }
    }

    fn apply_line(&mut self, raw: &str) -> LineOutcome {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.starts_with(':') || line.trim().is_empty() {
            return LineOutcome::Consumed;
        }
        let Some(data) = strip_data_prefix(line) else {
            return LineOutcome::Consumed;
        };
        let payload = data.trim();
        if payload == DONE_MARKER {
            return LineOutcome::Done;
        }
        match serde_json::from_str::<Value>(payload) {
            Ok(chunk) => {
                if let Some(delta) = delta_content(&chunk) {
                    self.content.push_str(delta);
                }
                LineOutcome::Consumed
            }
            Err(_) => LineOutcome::Incomplete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    pub content: String,
    pub discarded_bytes: usize,
}

/// Extracts `choices[0].delta.content` from a chat-completion chunk.
pub fn delta_content(chunk: &Value) -> Option<&str> {
    chunk
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
}

fn strip_data_prefix(line: &str) -> Option<&str> {
    if let Some(data) = line.strip_prefix("data: ") {
        return Some(data);
    }
    line.strip_prefix("data:").map(str::trim_start)
}

/// Formats a content delta as one SSE data line, the way the gateway emits it.
pub fn encode_delta(content: &str) -> String {
    let chunk = serde_json::json!({
        "choices": [{ "index": 0, "delta": { "content": content } }]
    });
    format!("data: {chunk}\n\n")
}
