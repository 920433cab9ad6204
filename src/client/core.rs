use crate::client::chat::ChatRequest;
use crate::client::error_classification::{classify_status, error_message, is_retryable_status};
use crate::config::ClientConfig;
use crate::pipeline::Pipeline;
use crate::transport::HttpTransport;
use crate::types::events::StreamingEvent;
use crate::types::message::Message;
use crate::{BoxStream, Error, Result};
use futures::{StreamExt, TryStreamExt};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Streaming client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct ChatClient {
    pub(crate) config: ClientConfig,
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) pipeline: Arc<Pipeline>,
}

impl ChatClient {
    /// Client configured from the environment (`LLM_APIKEY`, `.env`, ...).
    pub fn new() -> Result<Self> {
        crate::client::builder::ChatClientBuilder::from_env().build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn header_first(headers: &HeaderMap, names: &[&str]) -> Option<String> {
        for name in names {
            if let Some(v) = headers.get(*name) {
                if let Ok(s) = v.to_str() {
                    let s = s.trim();
                    if !s.is_empty() {
                        return Some(s.to_string());
                    }
                }
            }
        }
        None
    }

    /// Only the `Retry-After: <seconds>` form is supported.
    fn retry_after_ms(headers: &HeaderMap) -> Option<u32> {
        let raw = Self::header_first(headers, &["retry-after"])?;
        let secs: u32 = raw.parse().ok()?;
        Some(secs.saturating_mul(1000))
    }

    /// Stream events for `messages`, using the configured sampling options.
    pub async fn chat_stream(
        &self,
        messages: &[Message],
    ) -> Result<BoxStream<'static, StreamingEvent>> {
        let mut request = ChatRequest::new(messages.to_vec());
        request.temperature = self.config.temperature;
        request.max_tokens = self.config.max_tokens;
        self.stream_request(&request).await
    }

    /// Stream only the text deltas for `messages`.
    pub async fn text_stream(&self, messages: &[Message]) -> Result<BoxStream<'static, String>> {
        let events = self.chat_stream(messages).await?;
        let text = events.try_filter_map(|ev| async move {
            Ok(match ev {
                StreamingEvent::ContentDelta { content } => Some(content),
                _ => None,
            })
        });
        Ok(Box::pin(text))
    }

    /// Collect the whole answer for `messages`.
    pub async fn complete(&self, messages: &[Message]) -> Result<String> {
        let mut text = self.text_stream(messages).await?;
        let mut out = String::new();
        while let Some(chunk) = text.next().await {
            out.push_str(&chunk?);
        }
        Ok(out)
    }

    /// Send a single streaming request.
    pub async fn stream_request(
        &self,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, StreamingEvent>> {
        let client_request_id = Uuid::new_v4().to_string();
        let body = request.to_body(&self.config.model);

        debug!(
            model = self.config.model.as_str(),
            messages = request.messages.len(),
            request_id = client_request_id.as_str(),
            "sending chat completion request"
        );

        let start = std::time::Instant::now();
        let resp = self
            .transport
            .execute_stream_response(CHAT_COMPLETIONS_PATH, &body, Some(&client_request_id))
            .await?;

        let status = resp.status().as_u16();
        let upstream_request_id = Self::header_first(
            resp.headers(),
            &["x-request-id", "request-id", "cf-ray"],
        );

        if !resp.status().is_success() {
            let class = classify_status(status).to_string();
            let retry_after_ms = Self::retry_after_ms(resp.headers());
            let reason = resp.status().canonical_reason().unwrap_or("");
            let body = match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(http_status = status, error = %e, "failed to read error body");
                    String::new()
                }
            };
            let mut message = error_message(&body);
            if message.is_empty() {
                message = reason.to_string();
            }

            info!(
                http_status = status,
                error_class = class.as_str(),
                model = self.config.model.as_str(),
                request_id = client_request_id.as_str(),
                duration_ms = start.elapsed().as_millis(),
                "chat completion request failed"
            );

            return Err(Error::Remote {
                status,
                class,
                message,
                retryable: is_retryable_status(status),
                retry_after_ms,
            });
        }

        info!(
            http_status = status,
            model = self.config.model.as_str(),
            request_id = client_request_id.as_str(),
            upstream_request_id = upstream_request_id.as_deref().unwrap_or(""),
            duration_ms = start.elapsed().as_millis(),
            "chat completion stream opened"
        );

        let response_stream = HttpTransport::body_stream(resp, self.transport.timeout());
        self.pipeline.process_stream(response_stream).await
    }
}
