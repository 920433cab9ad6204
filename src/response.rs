//! Text responder.
//!
//! Wraps the client in the shape a chat front-end wants: plain text chunks in,
//! nothing fallible out. Any failure, whether building the client, opening the
//! request or mid-stream, is logged and delivered as one last chunk
//! `An error occurred: <error>`.

use crate::client::ChatClient;
use crate::history::format_chat_history;
use crate::types::message::{HistoryEntry, Message};
use crate::{BoxStream, Result};
use futures::{future, stream, Future, Stream, StreamExt};
use tracing::error;

/// Prefix of the chunk that replaces a failed response.
pub const ERROR_PREFIX: &str = "An error occurred: ";

/// Reusable responder around a built [`ChatClient`].
#[derive(Clone)]
pub struct LlmResponder {
    client: ChatClient,
}

impl LlmResponder {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ChatClient::new()?))
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    /// Stream the answer to `user_input` given the prior `chat_history`.
    pub fn respond(
        &self,
        user_input: &str,
        chat_history: Option<&[HistoryEntry]>,
    ) -> impl Stream<Item = String> + Send + 'static {
        let client = self.client.clone();
        let messages = build_messages(user_input, chat_history);
        fold_errors(async move { client.text_stream(&messages).await })
    }
}

/// Stream the answer to `user_input`, building a client from the environment.
///
/// Equivalent to `LlmResponder::from_env()?.respond(..)` except that a client
/// construction failure is reported in-stream like every other error.
pub fn get_llm_response(
    user_input: &str,
    chat_history: Option<&[HistoryEntry]>,
) -> impl Stream<Item = String> + Send + 'static {
    let messages = build_messages(user_input, chat_history);
    fold_errors(async move {
        let client = ChatClient::new()?;
        client.text_stream(&messages).await
    })
}

/// History (or none) plus the new user turn.
pub fn build_messages(user_input: &str, chat_history: Option<&[HistoryEntry]>) -> Vec<Message> {
    let mut messages = format_chat_history(chat_history.unwrap_or_default());
    messages.push(Message::user(user_input));
    messages
}

/// Flatten an opening future and its text stream into infallible chunks.
fn fold_errors<F>(open: F) -> impl Stream<Item = String> + Send + 'static
where
    F: Future<Output = Result<BoxStream<'static, String>>> + Send + 'static,
{
    stream::once(open)
        .map(|opened| match opened {
            Ok(text) => text.left_stream(),
            Err(e) => stream::once(future::ready(Err(e))).right_stream(),
        })
        .flatten()
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            future::ready(Some(match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    error!(error = %e, "LLM response failed");
                    *failed = true;
                    format!("{ERROR_PREFIX}{e}")
                }
            }))
        })
}
