//! Chat relay engine
//!
//! Fans messages out to registered connections.

pub mod broadcast;

pub use broadcast::broadcast;
