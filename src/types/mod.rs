//! # Types Module
//!
//! Core data types shared by the history formatter, the client and the
//! streaming pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Typed chat message sent to the model |
//! | [`MessageRole`] | Message role (system, user, assistant) |
//! | [`HistoryEntry`] | Loose role/content pair as received from a UI or file |
//! | [`StreamingEvent`] | Event decoded from the streaming response |
//!
//! ## Example
//!
//! ```rust
//! use llm_chat_stream::types::{HistoryEntry, Message};
//!
//! let system = Message::system("You are a helpful assistant");
//! let entry: HistoryEntry = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
//! assert_eq!(entry.role.as_deref(), Some("user"));
//! # let _ = system;
//! ```

pub mod events;
pub mod message;

pub use events::StreamingEvent;
pub use message::{HistoryEntry, Message, MessageRole};
