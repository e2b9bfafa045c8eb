//! marginalia/crates/domains/src/lib.rs
//!
//! The central data model and port definitions for Marginalia.

pub mod email;
pub mod error;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use email::*;
pub use error::*;
pub use models::*;
pub use ports::*;
