//! # Conversation Feature
//!
//! Message log and persona-scoped conversation lifecycle.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod state;

pub use state::{ConversationState, Message, Role};
