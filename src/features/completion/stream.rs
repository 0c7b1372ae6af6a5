//! # Fragment Stream
//!
//! Ordered channel of reply fragments with explicit completion and error
//! signals.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use crate::core::error::CompletionServiceError;
use tokio::sync::mpsc;

/// Default channel capacity between the network task and the consumer
pub const FRAGMENT_BUFFER: usize = 64;

/// One event from a streaming completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental reply text, in arrival order
    Fragment(String),
    /// The service finished the reply
    Done,
    /// The stream failed; no further events follow
    Failed(CompletionServiceError),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Fragment(_))
    }
}

/// Consumer side of a streaming completion.
///
/// Finite and not restartable. Dropping it closes the channel, which stops the
/// producer at its next send.
#[derive(Debug)]
pub struct FragmentStream {
    rx: mpsc::Receiver<StreamEvent>,
    finished: bool,
}

impl FragmentStream {
    /// Create a bounded producer/consumer pair
    pub fn channel(capacity: usize) -> (mpsc::Sender<StreamEvent>, FragmentStream) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, FragmentStream::new(rx))
    }

    pub fn new(rx: mpsc::Receiver<StreamEvent>) -> Self {
        FragmentStream {
            rx,
            finished: false,
        }
    }

    /// Next event. A producer that disappears without a terminal event is
    /// reported as `Failed(Interrupted)`. Returns `None` once a terminal event
    /// has been yielded.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        if self.finished {
            return None;
        }

        let event = match self.rx.recv().await {
            Some(event) => event,
            None => StreamEvent::Failed(CompletionServiceError::Interrupted),
        };
        if event.is_terminal() {
            self.finished = true;
            self.rx.close();
        }
        Some(event)
    }

    /// Drain the stream into the full reply text
    pub async fn collect(mut self) -> Result<String, CompletionServiceError> {
        let mut reply = String::new();
        while let Some(event) = self.next().await {
            match event {
                StreamEvent::Fragment(text) => reply.push_str(&text),
                StreamEvent::Done => return Ok(reply),
                StreamEvent::Failed(e) => return Err(e),
            }
        }
        Err(CompletionServiceError::Interrupted)
    }
}
