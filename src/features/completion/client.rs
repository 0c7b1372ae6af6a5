//! # Completion Client
//!
//! Streaming chat completions against a hosted OpenAI-compatible endpoint.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use crate::core::error::CompletionServiceError;
use crate::core::Config;
use crate::features::completion::stream::{FragmentStream, StreamEvent, FRAGMENT_BUFFER};
use crate::features::conversation::{Message, Role};
use async_trait::async_trait;
use log::{debug, warn};
use openai::chat::{ChatCompletion, ChatCompletionDelta, ChatCompletionMessage, ChatCompletionMessageRole};
use openai::Credentials;
use tokio::sync::mpsc;

/// A chat-completion backend that streams its reply
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the full history (system message included) and stream the reply.
    ///
    /// Errors here mean the stream never opened; failures after that arrive
    /// as `StreamEvent::Failed` on the returned stream.
    async fn stream_completion(
        &self,
        history: &[Message],
    ) -> Result<FragmentStream, CompletionServiceError>;

    /// Model identifier, for display and logging
    fn model(&self) -> &str;
}

pub struct OpenAiCompletionClient {
    model: String,
    credentials: Credentials,
}

impl OpenAiCompletionClient {
    pub fn new(config: &Config) -> Self {
        OpenAiCompletionClient {
            model: config.model.clone(),
            credentials: Credentials::new(config.api_key.clone(), config.base_url.clone()),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn stream_completion(
        &self,
        history: &[Message],
    ) -> Result<FragmentStream, CompletionServiceError> {
        let messages: Vec<ChatCompletionMessage> = history.iter().map(to_openai_message).collect();
        debug!(
            "Opening completion stream: model={} messages={}",
            self.model,
            messages.len()
        );

        let upstream = ChatCompletion::builder(&self.model, messages)
            .credentials(self.credentials.clone())
            .create_stream()
            .await
            .map_err(|e| CompletionServiceError::Request(e.to_string()))?;

        let (tx, stream) = FragmentStream::channel(FRAGMENT_BUFFER);
        tokio::spawn(forward_deltas(upstream, tx));
        Ok(stream)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn to_openai_role(role: Role) -> ChatCompletionMessageRole {
    match role {
        Role::System => ChatCompletionMessageRole::System,
        Role::User => ChatCompletionMessageRole::User,
        Role::Assistant => ChatCompletionMessageRole::Assistant,
    }
}

fn to_openai_message(message: &Message) -> ChatCompletionMessage {
    ChatCompletionMessage {
        role: to_openai_role(message.role),
        content: Some(message.content.clone()),
        name: None,
        function_call: None,
        tool_call_id: None,
        tool_calls: None,
    }
}

/// Relay delta content as fragments until a choice reports a finish reason.
///
/// The upstream receiver closes without a finish reason when the HTTP stream
/// fails (bad key, network drop, rate limit, undecodable frame), so that case
/// is reported as `Interrupted`.
async fn forward_deltas(
    mut upstream: mpsc::Receiver<ChatCompletionDelta>,
    tx: mpsc::Sender<StreamEvent>,
) {
    let mut finished = false;
    let mut fragments = 0usize;

    while let Some(delta) = upstream.recv().await {
        for choice in delta.choices {
            if let Some(content) = choice.delta.content {
                if !content.is_empty() {
                    fragments += 1;
                    if tx.send(StreamEvent::Fragment(content)).await.is_err() {
                        debug!("Fragment consumer dropped after {fragments} fragment(s)");
                        return;
                    }
                }
            }
            if choice.finish_reason.is_some() {
                finished = true;
            }
        }
        if finished {
            break;
        }
    }

    let terminal = if finished {
        debug!("Completion stream finished after {fragments} fragment(s)");
        StreamEvent::Done
    } else {
        warn!("Completion stream closed without a finish reason after {fragments} fragment(s)");
        StreamEvent::Failed(CompletionServiceError::Interrupted)
    };
    let _ = tx.send(terminal).await;
}
