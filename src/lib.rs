//! # llm-chat-stream
//!
//! Format a chat history and stream tokens from a hosted, OpenAI-compatible
//! LLM endpoint.
//!
//! ## Overview
//!
//! The crate is a thin adapter over the chat-completions streaming API:
//!
//! - **History formatting**: loose role/content entries become typed
//!   [`Message`]s behind a fixed system prompt ([`history`])
//! - **Streaming client**: [`ChatClient`] posts the conversation and decodes the
//!   Server-Sent Events body into [`StreamingEvent`]s ([`client`], [`pipeline`])
//! - **Text responder**: [`get_llm_response`] yields plain text chunks and turns
//!   any failure into a final `An error occurred: ...` chunk ([`response`])
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use llm_chat_stream::{get_llm_response, HistoryEntry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let history = vec![
//!         HistoryEntry::new("user", "What is Rust?"),
//!         HistoryEntry::new("assistant", "A systems programming language."),
//!     ];
//!
//!     let mut chunks = Box::pin(get_llm_response("Who maintains it?", Some(history.as_slice())));
//!     while let Some(chunk) = chunks.next().await {
//!         print!("{chunk}");
//!     }
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Client configuration from env, YAML and defaults |
//! | [`history`] | Chat history formatting |
//! | [`client`] | Streaming chat client and builder |
//! | [`pipeline`] | SSE decoding and event mapping |
//! | [`transport`] | HTTP transport |
//! | [`response`] | Text-chunk responder with error folding |
//! | [`types`] | Messages, history entries and streaming events |

pub mod client;
pub mod config;
pub mod history;
pub mod pipeline;
pub mod response;
pub mod transport;
pub mod types;

pub use client::{ChatClient, ChatClientBuilder};
pub use config::ClientConfig;
pub use history::{format_chat_history, SYSTEM_PROMPT};
pub use response::{get_llm_response, LlmResponder};
pub use types::{
    events::StreamingEvent,
    message::{HistoryEntry, Message, MessageRole},
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A specialized Result for pipeline operations
pub type PipeResult<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `PipeResult<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = PipeResult<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
