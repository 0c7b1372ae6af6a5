//! # Personas Feature
//!
//! Data-driven table of literary personas the user can chat with.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Persona files extend the built-in table
//! - 1.0.0: Initial release

pub mod registry;

pub use registry::{Persona, PersonaFile, PersonaRegistry};
