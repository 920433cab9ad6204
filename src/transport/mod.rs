//! HTTP transport for the chat-completions endpoint.

pub mod http;

pub use http::{HttpTransport, TransportError};
