//! # Features
//!
//! Persona registry, conversation state, completion client and the session
//! state machine that ties them together.

pub mod completion;
pub mod conversation;
pub mod personas;
pub mod session;

pub use completion::{CompletionClient, FragmentStream, OpenAiCompletionClient, StreamEvent};
pub use conversation::{ConversationState, Message, Role};
pub use personas::{Persona, PersonaRegistry};
pub use session::{ChatSession, ExchangeOutcome, FailedReply, Phase};
