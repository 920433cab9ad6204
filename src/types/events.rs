//! Streaming events decoded from a chat-completions response

use serde::{Deserialize, Serialize};

/// Unified streaming event enum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum StreamingEvent {
    /// Partial content delta (text streaming)
    #[serde(rename = "ContentDelta")]
    ContentDelta { content: String },

    /// Metadata (usage, finish reason)
    #[serde(rename = "Metadata")]
    Metadata {
        #[serde(skip_serializing_if = "Option::is_none")]
        usage: Option<serde_json::Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },

    /// Stream end
    #[serde(rename = "StreamEnd")]
    StreamEnd {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },
}

impl StreamingEvent {
    /// Text carried by this event, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StreamingEvent::ContentDelta { content } => Some(content),
            _ => None,
        }
    }
}
