//! Client management system
//!
//! Handles client connections, identity registration, and session lifecycle.

pub mod handler;
pub mod identity;
pub mod registry;

pub use handler::handle_client;
pub use identity::Identity;
pub use registry::{ConnId, Registry};
