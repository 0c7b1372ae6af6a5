//! # Core Module
//!
//! Configuration and error handling shared by every persona chat feature.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::Config;
pub use error::{CompletionServiceError, ConfigurationError, SessionError, UnknownPersonaKind};
