//! feedback-board/crates/domains/src/lib.rs
//!
//! Domain entities, port traits and the shared error type for the feedback
//! board. Nothing in this crate performs I/O; adapters implement the ports.

pub mod errors;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;
