//! Chat wire protocol
//!
//! Plain-text, newline-terminated message formats exchanged with clients.

pub mod messages;
