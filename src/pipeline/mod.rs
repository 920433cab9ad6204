//! # Streaming Pipeline
//!
//! Turns the raw response body of a streaming chat-completions call into
//! [`StreamingEvent`]s.
//!
//! ```text
//! Raw Bytes → Decoder → Mapper → Events
//!     │          │         │
//!   HTTP      SSE frames  ContentDelta,
//!   body      → JSON      Metadata, StreamEnd
//! ```
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Pipeline`] | Decoder + mapper pair |
//! | [`PipelineBuilder`] | Builder for custom stage combinations |
//! | [`Decoder`] | Byte stream → JSON frames ([`decode::SseDecoder`]) |
//! | [`Mapper`] | JSON frames → events ([`event_map::ChatCompletionMapper`]) |
//!
//! ## Example
//!
//! ```rust
//! use futures::StreamExt;
//! use llm_chat_stream::pipeline::Pipeline;
//! use llm_chat_stream::StreamingEvent;
//!
//! # tokio_test::block_on(async {
//! let body = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n";
//! let bytes = futures::stream::iter(vec![Ok::<_, llm_chat_stream::Error>(bytes::Bytes::from(body))]);
//!
//! let pipeline = Pipeline::chat_completions();
//! let mut events = pipeline.process_stream(Box::pin(bytes)).await?;
//! let first = events.next().await.unwrap()?;
//! assert_eq!(first, StreamingEvent::ContentDelta { content: "Hi".into() });
//! # Ok::<(), llm_chat_stream::Error>(())
//! # });
//! ```

pub mod decode;
pub mod event_map;


use crate::types::events::StreamingEvent;
use crate::{BoxStream, PipeResult};

/// Decoder trait for stream decoding
#[async_trait::async_trait]
pub trait Decoder: Send + Sync {
    /// Decode a byte stream into JSON values
    async fn decode_stream(
        &self,
        input: BoxStream<'static, bytes::Bytes>,
    ) -> PipeResult<BoxStream<'static, serde_json::Value>>;
}

/// Specialized mapper for the final stage of the pipeline
#[async_trait::async_trait]
pub trait Mapper: Send + Sync {
    /// A mapper takes a stream of JSON values and returns a stream of events
    async fn map(
        &self,
        input: BoxStream<'static, serde_json::Value>,
    ) -> PipeResult<BoxStream<'static, StreamingEvent>>;
}

/// Pipeline error types
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Decoder error: {0}")]
    Decoder(String),

    #[error("Event mapper error: {0}")]
    EventMapper(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Pipeline builder
pub struct PipelineBuilder {
    decoder: Option<Box<dyn Decoder>>,
    mapper: Option<Box<dyn Mapper>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            decoder: None,
            mapper: None,
        }
    }

    pub fn set_decoder(mut self, decoder: Box<dyn Decoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn set_mapper(mut self, mapper: Box<dyn Mapper>) -> Self {
        self.mapper = Some(mapper);
        self
    }

    pub fn build(self) -> Result<Pipeline, PipelineError> {
        Ok(Pipeline {
            decoder: self
                .decoder
                .ok_or_else(|| PipelineError::Configuration("Decoder is required".to_string()))?,
            mapper: self.mapper.ok_or_else(|| {
                PipelineError::Configuration("Event mapper is required".to_string())
            })?,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Pipeline {
    decoder: Box<dyn Decoder>,
    mapper: Box<dyn Mapper>,
}

impl Pipeline {
    /// SSE framing with OpenAI chat-completion chunk mapping.
    pub fn chat_completions() -> Self {
        Self {
            decoder: Box::new(decode::SseDecoder::default()),
            mapper: Box::new(event_map::ChatCompletionMapper),
        }
    }

    pub async fn process_stream(
        &self,
        input: BoxStream<'static, bytes::Bytes>,
    ) -> PipeResult<BoxStream<'static, StreamingEvent>> {
        let frames = self.decoder.decode_stream(input).await?;
        self.mapper.map(frames).await
    }
}
