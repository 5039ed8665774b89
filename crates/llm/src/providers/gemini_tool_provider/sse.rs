//! SSE framing and chunk parsing for the Gemini streaming API.

use serde_json::Value;
use tracing::trace;

use finder_tool_runtime::stream::{StopReason, StreamEvent};

/// Splits a byte stream into SSE `data` payloads.
///
/// Bytes are buffered until a full line is available, so multi-byte UTF-8
/// sequences split across network chunks decode correctly. Several `data:`
/// lines in one event are joined with `\n`; other fields are ignored.
#[derive(Debug, Default)]
pub(super) struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns every event completed by them.
    pub(super) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            self.take_line(line, &mut events);
        }

        events
    }

    /// Flush whatever is left when the body ends without a blank line.
    pub(super) fn finish(&mut self) -> Option<String> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw).into_owned();
            self.take_line(line.trim_end_matches('\r'), &mut events);
        }
        self.take_line("", &mut events);
        events.pop()
    }

    fn take_line(&mut self, line: &str, events: &mut Vec<String>) {
        if line.is_empty() {
            if !self.data.is_empty() {
                events.push(std::mem::take(&mut self.data).join("\n"));
            }
        } else if let Some(data) = line.strip_prefix("data:") {
            self.data.push(data.strip_prefix(' ').unwrap_or(data).to_string());
        } else {
            trace!(line, "ignoring SSE field");
        }
    }
}

/// Turns `GenerateContentResponse` chunks into [`StreamEvent`]s.
///
/// Gemini sends each function call whole, so one call becomes a
/// start/delta/end triple. Calls without an id get `call_{n}`, numbered per
/// response.
#[derive(Debug, Default)]
pub(super) struct ChunkParser {
    calls_seen: usize,
    finished: bool,
}

impl ChunkParser {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn parse(&mut self, data: &str) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        let parsed: Value = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(e) => {
                events.push(StreamEvent::Error {
                    message: format!("unparseable stream chunk: {e}"),
                });
                return events;
            }
        };

        if let Some(error) = parsed.get("error") {
            let message = error["message"]
                .as_str()
                .map(String::from)
                .unwrap_or_else(|| error.to_string());
            events.push(StreamEvent::Error { message });
            return events;
        }

        let candidate = &parsed["candidates"][0];

        if candidate.is_null() {
            if let Some(reason) = parsed["promptFeedback"]["blockReason"].as_str() {
                events.push(StreamEvent::Error {
                    message: format!("prompt blocked: {reason}"),
                });
                self.end(StopReason::Blocked, &mut events);
            }
            return events;
        }

        if let Some(parts) = candidate["content"]["parts"].as_array() {
            for part in parts {
                self.parse_part(part, &mut events);
            }
        }

        if let Some(reason) = candidate["finishReason"].as_str() {
            let stop_reason = match reason {
                "STOP" if self.calls_seen > 0 => StopReason::ToolUse,
                "STOP" => StopReason::EndTurn,
                "MAX_TOKENS" => StopReason::MaxTokens,
                other => {
                    events.push(StreamEvent::Error {
                        message: format!("response withheld: {other}"),
                    });
                    StopReason::Blocked
                }
            };
            self.end(stop_reason, &mut events);
        }

        events
    }

    /// Closing event for a body that ended without a `finishReason`.
    pub(super) fn finish(&mut self) -> Option<StreamEvent> {
        if self.finished {
            return None;
        }
        self.finished = true;
        let stop_reason = if self.calls_seen > 0 {
            StopReason::ToolUse
        } else {
            StopReason::EndTurn
        };
        Some(StreamEvent::MessageEnd { stop_reason })
    }

    fn parse_part(&mut self, part: &Value, events: &mut Vec<StreamEvent>) {
        // Thought summaries are not part of the answer.
        if part["thought"].as_bool() == Some(true) {
            return;
        }

        if let Some(text) = part["text"].as_str() {
            if !text.is_empty() {
                events.push(StreamEvent::TextDelta {
                    text: text.to_string(),
                });
            }
        }

        if let Some(call) = part.get("functionCall") {
            let id = call["id"]
                .as_str()
                .map(String::from)
                .unwrap_or_else(|| format!("call_{}", self.calls_seen));
            self.calls_seen += 1;
            let name = call["name"].as_str().unwrap_or_default().to_string();
            let args = match call.get("args") {
                Some(args) if !args.is_null() => args.to_string(),
                _ => "{}".to_string(),
            };

            // Gemini 3 rejects a replayed call whose signature is missing.
            let thought_signature = part["thoughtSignature"].as_str().map(String::from);

            events.push(StreamEvent::ToolCallStart {
                id: id.clone(),
                name,
                thought_signature,
            });
            events.push(StreamEvent::ToolCallDelta {
                id: id.clone(),
                arguments_delta: args,
            });
            events.push(StreamEvent::ToolCallEnd { id });
        }
    }

    fn end(&mut self, stop_reason: StopReason, events: &mut Vec<StreamEvent>) {
        if !self.finished {
            self.finished = true;
            events.push(StreamEvent::MessageEnd { stop_reason });
        }
    }
}
