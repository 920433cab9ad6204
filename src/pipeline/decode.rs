//! Streaming decoder (Bytes -> JSON Value)
//!
//! Server-Sent Events framing as emitted by OpenAI-compatible endpoints.

use crate::pipeline::Decoder;
use crate::{BoxStream, PipeResult};
use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;
use tracing::debug;

/// SSE decoder:
/// - splits frames on a blank line (`\r\n` is normalized to `\n`)
/// - joins the `data:` lines of a frame and parses them as JSON
/// - ignores comments (`:`), other SSE fields and non-JSON payloads
/// - stops on `done_signal` (default "[DONE]")
pub struct SseDecoder {
    done_signal: String,
}

impl SseDecoder {
    pub fn new(done_signal: Option<String>) -> Self {
        Self {
            done_signal: done_signal.unwrap_or_else(|| "[DONE]".to_string()),
        }
    }
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new(None)
    }
}

enum Frame {
    Payload(Value),
    Done,
    Skip,
}

fn parse_frame(frame: &str, done_signal: &str) -> Frame {
    let mut data_lines: Vec<&str> = Vec::new();
    let mut saw_field = false;

    for line in frame.lines() {
        if line.is_empty() {
            continue;
        }
        if line.starts_with(':') {
            saw_field = true;
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            saw_field = true;
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        } else if ["event:", "id:", "retry:"].iter().any(|f| line.starts_with(f)) {
            saw_field = true;
        }
    }

    // Some servers send bare JSON lines without any SSE field.
    let payload = if saw_field {
        data_lines.join("\n")
    } else {
        frame.to_string()
    };
    let payload = payload.trim();

    if payload.is_empty() {
        return Frame::Skip;
    }
    if payload == done_signal {
        return Frame::Done;
    }
    match serde_json::from_str(payload) {
        Ok(v) => Frame::Payload(v),
        Err(e) => {
            debug!(error = %e, "skipping non-JSON SSE frame");
            Frame::Skip
        }
    }
}

/// Move the longest valid UTF-8 prefix of `pending` into `out`.
///
/// A multi-byte character cut by a chunk boundary stays in `pending` until the
/// next chunk arrives.
fn drain_utf8(pending: &mut Vec<u8>, out: &mut String) {
    let valid = match std::str::from_utf8(pending) {
        Ok(s) => {
            out.push_str(s);
            pending.len()
        }
        Err(e) => {
            let valid = e.valid_up_to();
            out.push_str(&String::from_utf8_lossy(&pending[..valid]));
            match e.error_len() {
                // Truly invalid bytes: replace and move on.
                Some(bad) => {
                    out.push(char::REPLACEMENT_CHARACTER);
                    valid + bad
                }
                None => valid,
            }
        }
    };
    pending.drain(..valid);
    if out.contains('\r') {
        *out = out.replace("\r\n", "\n");
    }
}

struct SseState {
    input: BoxStream<'static, Bytes>,
    buf: String,
    pending: Vec<u8>,
    finished: bool,
}

#[async_trait::async_trait]
impl Decoder for SseDecoder {
    async fn decode_stream(
        &self,
        input: BoxStream<'static, Bytes>,
    ) -> PipeResult<BoxStream<'static, Value>> {
        let done_signal = self.done_signal.clone();
        let state = SseState {
            input,
            buf: String::new(),
            pending: Vec::new(),
            finished: false,
        };

        let stream = stream::unfold(state, move |mut st| {
            let done_signal = done_signal.clone();
            async move {
                if st.finished {
                    return None;
                }
                loop {
                    // If we have a full frame in buffer, emit it.
                    if let Some(idx) = st.buf.find("\n\n") {
                        let frame = st.buf[..idx].to_string();
                        st.buf.drain(..idx + 2);
                        match parse_frame(&frame, &done_signal) {
                            Frame::Payload(v) => return Some((Ok(v), st)),
                            Frame::Done => return None,
                            Frame::Skip => continue,
                        }
                    }

                    // Need more data.
                    match st.input.next().await {
                        Some(Ok(bytes)) => {
                            st.pending.extend_from_slice(&bytes);
                            drain_utf8(&mut st.pending, &mut st.buf);
                        }
                        Some(Err(e)) => {
                            st.finished = true;
                            return Some((Err(e), st));
                        }
                        None => {
                            // EOF: try the remaining buffer once
                            st.finished = true;
                            if !st.pending.is_empty() {
                                let tail = String::from_utf8_lossy(&st.pending).into_owned();
                                st.pending.clear();
                                st.buf.push_str(&tail);
                            }
                            let rest = std::mem::take(&mut st.buf);
                            return match parse_frame(&rest, &done_signal) {
                                Frame::Payload(v) => Some((Ok(v), st)),
                                Frame::Done | Frame::Skip => None,
                            };
                        }
                    }
                }
            }
        });

        Ok(Box::pin(stream))
    }
}
