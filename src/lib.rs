// Core layer - configuration and error types
pub mod core;

// Features layer - personas, conversation, completion, session
pub mod features;

// TUI layer - terminal user interface (optional feature)
#[cfg(feature = "tui")]
pub mod tui;

pub use crate::core::Config;

pub use features::{
    // Completion
    CompletionClient, FragmentStream, OpenAiCompletionClient, StreamEvent,
    // Conversation
    ConversationState, Message, Role,
    // Personas
    Persona, PersonaRegistry,
    // Session
    ChatSession, ExchangeOutcome, FailedReply, Phase,
};
