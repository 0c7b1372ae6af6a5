//! # Completion Feature
//!
//! Streaming chat-completion client and the fragment stream it yields.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod client;
pub mod stream;

#[cfg(test)]
pub(crate) mod scripted;

pub use client::{CompletionClient, OpenAiCompletionClient};
pub use stream::{FragmentStream, StreamEvent, FRAGMENT_BUFFER};
