//! Error types
//!
//! Defines domain-specific error types for each module of the chat server.

use std::fmt;
use std::io;

use config::ConfigError;

/// Username negotiation errors
///
/// All variants carry the offending candidate name so the rejection sent
/// back to the client can quote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Candidate name is shorter than the minimum length
    TooShort(String),
    /// Candidate name is longer than the maximum length
    TooLong(String),
    /// Another registered connection already holds this name
    Taken(String),
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::TooShort(name) => write!(f, "Username too short: {}", name),
            NameError::TooLong(name) => write!(f, "Username too long: {}", name),
            NameError::Taken(name) => write!(f, "Username already taken: {}", name),
        }
    }
}

impl std::error::Error for NameError {}

/// General chat server error that encompasses all error types
#[derive(Debug)]
pub enum ChatServerError {
    Name(NameError),
    Config(ConfigError),
    IoError(io::Error),
}

impl fmt::Display for ChatServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatServerError::Name(e) => write!(f, "Name error: {}", e),
            ChatServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ChatServerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ChatServerError {}

impl From<NameError> for ChatServerError {
    fn from(error: NameError) -> Self {
        ChatServerError::Name(error)
    }
}

impl From<ConfigError> for ChatServerError {
    fn from(error: ConfigError) -> Self {
        ChatServerError::Config(error)
    }
}

impl From<io::Error> for ChatServerError {
    fn from(error: io::Error) -> Self {
        ChatServerError::IoError(error)
    }
}
