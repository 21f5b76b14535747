//! Error handling
//!
//! Domain-specific error types for the chat relay server.

pub mod types;

pub use types::{ChatServerError, NameError};
