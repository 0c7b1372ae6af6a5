//! # Conversation State
//!
//! Active persona plus the ordered message log for one chat session.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Invariants
//! - `history[0]` is the system message of the active persona
//! - `history[1]` is that persona's greeting
//! - history only grows by appending; a persona switch replaces it wholesale

use crate::features::personas::Persona;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Message {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    persona_id: String,
    history: Vec<Message>,
}

impl ConversationState {
    /// Fresh conversation: the persona's system prompt followed by its greeting.
    pub fn new(persona: &Persona) -> Self {
        ConversationState {
            persona_id: persona.id.clone(),
            history: vec![
                Message::system(persona.system_prompt.clone()),
                Message::assistant(persona.greeting.clone()),
            ],
        }
    }

    /// Make `persona` the active one. Reselecting the active persona keeps the
    /// ongoing conversation; any other persona starts over.
    ///
    /// Returns `true` when the state was (re)initialized.
    pub fn select(state: &mut Option<ConversationState>, persona: &Persona) -> bool {
        if let Some(current) = state {
            if current.persona_id == persona.id {
                return false;
            }
        }
        *state = Some(ConversationState::new(persona));
        true
    }

    pub fn persona_id(&self) -> &str {
        &self.persona_id
    }

    /// Append a message. Content is not validated here.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.history.push(Message::new(role, content));
    }

    /// Full history, including the system message
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Messages for display: everything except system messages
    pub fn visible_history(&self) -> impl Iterator<Item = &Message> + '_ {
        self.history.iter().filter(|m| m.role != Role::System)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
