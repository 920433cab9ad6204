//! Chat history formatting.
//!
//! Converts the loose role/content entries kept by a chat front-end into the
//! typed message list sent to the model. The result always opens with
//! [`SYSTEM_PROMPT`]; user and assistant turns follow in their original order.

use crate::types::message::{HistoryEntry, Message, MessageRole};
use tracing::debug;

/// System prompt prepended to every conversation.
pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Provide informative \
and relevant responses based on the conversation context.";

/// Format a chat history into model messages.
///
/// Entries with a role other than `user` or `assistant` (including a missing
/// role) are dropped. A missing content becomes an empty string.
pub fn format_chat_history(entries: &[HistoryEntry]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(entries.len() + 1);
    messages.push(Message::system(SYSTEM_PROMPT));

    for (idx, entry) in entries.iter().enumerate() {
        let content = entry.content.clone().unwrap_or_default();
        match entry.role.as_deref().and_then(MessageRole::from_history_role) {
            Some(MessageRole::User) => messages.push(Message::user(content)),
            Some(MessageRole::Assistant) => messages.push(Message::assistant(content)),
            _ => {
                debug!(
                    index = idx,
                    role = entry.role.as_deref().unwrap_or("<missing>"),
                    "skipping history entry with unsupported role"
                );
            }
        }
    }

    messages
}
