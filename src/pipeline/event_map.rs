//! Event mapping (JSON Value -> StreamingEvent)
//!
//! Maps OpenAI-style `chat.completion.chunk` frames. Each frame may yield a
//! content delta and a metadata event; a single `StreamEnd` closes the stream.

use crate::pipeline::Mapper;
use crate::types::events::StreamingEvent;
use crate::{BoxStream, Error, PipeResult};
use futures::{stream, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use tracing::debug;

pub struct ChatCompletionMapper;

/// Events carried by one chunk, in emission order.
pub(crate) fn map_chunk(frame: &Value) -> PipeResult<Vec<StreamingEvent>> {
    if let Some(err) = frame.get("error") {
        return Err(in_band_error(err));
    }

    let mut events = Vec::new();
    let choice = frame.get("choices").and_then(|c| c.get(0));

    if let Some(content) = choice
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(|c| c.as_str())
    {
        // Role-only and tool frames carry null or empty content.
        if !content.is_empty() {
            events.push(StreamingEvent::ContentDelta {
                content: content.to_string(),
            });
        }
    }

    let finish_reason = choice
        .and_then(|c| c.get("finish_reason"))
        .and_then(|f| f.as_str())
        .map(str::to_string);
    let usage = frame.get("usage").filter(|u| !u.is_null()).cloned();

    if finish_reason.is_some() || usage.is_some() {
        events.push(StreamingEvent::Metadata {
            usage,
            finish_reason,
        });
    }

    Ok(events)
}

fn in_band_error(err: &Value) -> Error {
    let message = err
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string());
    let class = err
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("stream_error")
        .to_string();
    let status = err
        .get("code")
        .and_then(|c| c.as_u64())
        .and_then(|c| u16::try_from(c).ok())
        .unwrap_or(200);
    Error::Remote {
        status,
        class,
        message,
        retryable: false,
        retry_after_ms: None,
    }
}

struct MapState {
    input: BoxStream<'static, Value>,
    queue: VecDeque<PipeResult<StreamingEvent>>,
    last_finish_reason: Option<String>,
    ended: bool,
}

#[async_trait::async_trait]
impl Mapper for ChatCompletionMapper {
    async fn map(
        &self,
        input: BoxStream<'static, Value>,
    ) -> PipeResult<BoxStream<'static, StreamingEvent>> {
        let state = MapState {
            input,
            queue: VecDeque::new(),
            last_finish_reason: None,
            ended: false,
        };

        let stream = stream::unfold(state, |mut st| async move {
            loop {
                if let Some(item) = st.queue.pop_front() {
                    return Some((item, st));
                }
                if st.ended {
                    return None;
                }

                match st.input.next().await {
                    Some(Ok(frame)) => match map_chunk(&frame) {
                        Ok(events) => {
                            for ev in events {
                                if let StreamingEvent::Metadata {
                                    finish_reason: Some(r),
                                    ..
                                } = &ev
                                {
                                    st.last_finish_reason = Some(r.clone());
                                }
                                st.queue.push_back(Ok(ev));
                            }
                        }
                        Err(e) => {
                            st.ended = true;
                            st.queue.push_back(Err(e));
                        }
                    },
                    Some(Err(e)) => {
                        st.ended = true;
                        st.queue.push_back(Err(e));
                    }
                    None => {
                        debug!(
                            finish_reason = st.last_finish_reason.as_deref().unwrap_or("none"),
                            "chat completion stream finished"
                        );
                        st.ended = true;
                        st.queue.push_back(Ok(StreamingEvent::StreamEnd {
                            finish_reason: st.last_finish_reason.clone(),
                        }));
                    }
                }
            }
        });

        Ok(Box::pin(stream))
    }
}
