//! # Client Module
//!
//! [`ChatClient`] sends a conversation to the chat-completions endpoint and
//! streams the answer back as [`crate::StreamingEvent`]s or plain text.
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use llm_chat_stream::{ChatClientBuilder, Message};
//!
//! # async fn run() -> llm_chat_stream::Result<()> {
//! let client = ChatClientBuilder::new()
//!     .api_key("sk-...")
//!     .temperature(0.3)
//!     .build()?;
//!
//! let mut text = client.text_stream(&[Message::user("Hello")]).await?;
//! while let Some(chunk) = text.next().await {
//!     print!("{}", chunk?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod chat;
pub mod core;
mod error_classification;

pub use builder::ChatClientBuilder;
pub use chat::ChatRequest;
pub use self::core::ChatClient;
