//! Chat message formatting
//!
//! Defines the server-to-client message templates.

use crate::client::registry::{MAX_NAME_LEN, MIN_NAME_LEN};
use crate::error::NameError;

/// Prompt sent while a connection negotiates its username (no trailing newline)
pub const USERNAME_PROMPT: &str = "Enter your username: ";

/// Sent to a connection that arrives while the server is at capacity
pub const SERVER_FULL: &str = "The server is full\n";

/// Rejection line for a failed username registration
pub fn name_rejection(error: &NameError) -> String {
    match error {
        NameError::TooShort(name) => format!(
            "The username {} is shorter than {} characters\n",
            name, MIN_NAME_LEN
        ),
        NameError::TooLong(name) => format!(
            "The username {} is longer than {} characters\n",
            name, MAX_NAME_LEN
        ),
        NameError::Taken(name) => format!("The username {} is already taken\n", name),
    }
}

/// Announcement that a user joined the chat
pub fn joined(name: &str) -> String {
    format!("{} joined the chat\n", name)
}

/// Announcement that a user left the chat
pub fn left(name: &str) -> String {
    format!("{} left the chat\n", name)
}

/// A relayed chat line, stamped with the sender's name
pub fn chat_line(name: &str, line: &str) -> String {
    format!("{}: {}\n", name, line)
}
