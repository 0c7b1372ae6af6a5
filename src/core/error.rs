//! # Error Taxonomy
//!
//! Typed errors shared across the persona chat features.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use std::path::PathBuf;
use thiserror::Error;

/// Startup configuration problems. Always fatal: the chat surface never opens.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("secrets file not found at {}; create it with an OPENAI_API_KEY entry or export OPENAI_API_KEY", path.display())]
    SecretsFileNotFound { path: PathBuf },

    #[error("secrets file {} could not be read: {reason}", path.display())]
    SecretsFileUnreadable { path: PathBuf, reason: String },

    #[error("OPENAI_API_KEY is not set in the environment or in {}", path.display())]
    MissingApiKey { path: PathBuf },

    #[error("OPENAI_API_KEY is invalid: {0}")]
    InvalidApiKey(String),

    #[error("setting {name} is invalid: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("persona file {} is invalid: {reason}", path.display())]
    PersonaFile { path: PathBuf, reason: String },
}

/// A persona id that is not present in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown persona kind: {0}")]
pub struct UnknownPersonaKind(pub String);

/// Failures talking to the hosted chat-completion service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionServiceError {
    /// The request could not be sent or the stream could not be opened
    #[error("completion request failed: {0}")]
    Request(String),

    /// The stream ended before the service signalled completion
    #[error("completion stream ended early (network, credential or rate-limit failure)")]
    Interrupted,

    /// The service sent something we could not interpret
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

/// Rejections from the chat session state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("message is empty")]
    EmptyInput,

    #[error("a reply is still streaming")]
    Busy,

    #[error("no persona selected")]
    NoActivePersona,

    #[error(transparent)]
    UnknownPersona(#[from] UnknownPersonaKind),
}
