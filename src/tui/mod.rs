//! # TUI Module
//!
//! Terminal chat surface: persona selector, transcript and input box.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Initial chat screen with streamed replies

pub mod app;
pub mod event;
pub mod ui;

pub use app::{App, Focus};
pub use event::{spawn_completion, Event, EventHandler};
