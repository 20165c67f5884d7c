//! Server-Sent Events decoding for the `/api/chat/stream` endpoint.
//!
//! Each `data:` line carries one JSON object tagged by `type`. Lines are
//! reassembled across chunk boundaries before parsing, so the result does
//! not depend on how the transport splits the body.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::stream::unfold;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ChatError;

/// Stream of decoded frames from a chat stream response
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<SseFrame, ChatError>> + Send>>;

/// Event variants the chat service emits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Update {
        #[serde(default)]
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        audio_url: Option<String>,
    },
    Error {
        #[serde(default)]
        message: String,
    },
    Done,
}

/// One `data:` line after decoding
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    Event(StreamEvent),
    /// Well-formed JSON with a `type` this client does not know
    Unrecognized { kind: String, payload: String },
    /// Payload that could not be interpreted as an event
    Malformed { payload: String, reason: String },
}

const KNOWN_TYPES: [&str; 3] = ["update", "error", "done"];

/// Interpret the payload of a single `data:` field.
pub fn parse_payload(payload: &str) -> SseFrame {
    let malformed = |reason: String| SseFrame::Malformed {
        payload: payload.to_string(),
        reason,
    };

    let value: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => return malformed(e.to_string()),
    };

    let kind = match value.get("type").and_then(Value::as_str) {
        Some(k) => k.to_string(),
        None => return malformed("missing string field `type`".to_string()),
    };

    if !KNOWN_TYPES.contains(&kind.as_str()) {
        return SseFrame::Unrecognized {
            kind,
            payload: payload.to_string(),
        };
    }

    match serde_json::from_value::<StreamEvent>(value) {
        Ok(event) => SseFrame::Event(event),
        Err(e) => malformed(e.to_string()),
    }
}

/// Interpret one raw line. Returns `None` for blank lines, comments and
/// non-`data` fields.
pub fn parse_line(line: &[u8]) -> Option<SseFrame> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    let payload = line.strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    Some(parse_payload(payload))
}

/// Incremental line splitter over raw body chunks.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every frame completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(frame) = parse_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

/// Turn a body byte stream into a stream of frames.
///
/// A transport error is yielded once and ends the stream.
pub fn sse_frames<S, B, E>(bytes_stream: S) -> FrameStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ChatError> + Send + 'static,
{
    let initial_state = (
        Box::pin(bytes_stream),
        SseDecoder::new(),
        VecDeque::<SseFrame>::new(),
        false,
    );

    Box::pin(unfold(
        initial_state,
        |(mut stream, mut decoder, mut pending, mut finished)| async move {
            loop {
                if let Some(frame) = pending.pop_front() {
                    return Some((Ok(frame), (stream, decoder, pending, finished)));
                }
                if finished {
                    return None;
                }
                match stream.next().await {
                    Some(Ok(chunk)) => pending.extend(decoder.push(chunk.as_ref())),
                    Some(Err(e)) => {
                        finished = true;
                        let err: ChatError = e.into();
                        return Some((Err(err), (stream, decoder, pending, finished)));
                    }
                    None => {
                        finished = true;
                        pending.extend(decoder.finish());
                    }
                }
            }
        },
    ))
}
