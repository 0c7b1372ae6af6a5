//! In-memory completion client that replays a fixed script.

use crate::core::error::CompletionServiceError;
use crate::features::completion::{CompletionClient, FragmentStream, StreamEvent};
use crate::features::conversation::Message;
use async_trait::async_trait;
use std::sync::Mutex;

pub(crate) struct ScriptedClient {
    script: Vec<StreamEvent>,
    open_error: Option<CompletionServiceError>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedClient {
    /// Replies with `fragments` then `Done`
    pub fn replying(fragments: &[&str]) -> Self {
        let mut script: Vec<StreamEvent> = fragments
            .iter()
            .map(|f| StreamEvent::Fragment(f.to_string()))
            .collect();
        script.push(StreamEvent::Done);
        Self::with_script(script)
    }

    /// Sends the events as given; a script without a terminal event ends as a
    /// dropped producer.
    pub fn with_script(script: Vec<StreamEvent>) -> Self {
        ScriptedClient {
            script,
            open_error: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_to_open(error: CompletionServiceError) -> Self {
        ScriptedClient {
            script: Vec::new(),
            open_error: Some(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Histories received, one per call
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn stream_completion(
        &self,
        history: &[Message],
    ) -> Result<FragmentStream, CompletionServiceError> {
        self.requests.lock().unwrap().push(history.to_vec());
        if let Some(e) = &self.open_error {
            return Err(e.clone());
        }

        let (tx, stream) = FragmentStream::channel(self.script.len().max(1));
        let script = self.script.clone();
        tokio::spawn(async move {
            for event in script {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
        });
        Ok(stream)
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
