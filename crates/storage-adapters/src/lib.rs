//! # storage-adapters
//!
//! Implementations of the persistence ports: in-memory and SQLite comment
//! stores, newsletter and account stores and the filesystem essay store.

mod clock;
pub mod essays;
pub mod memory;
#[cfg(feature = "db-sqlite")]
pub mod sqlite;

pub use essays::FsEssayStore;
pub use memory::{MemoryAccountStore, MemoryCommentStore, MemoryNewsletterStore};
#[cfg(feature = "db-sqlite")]
pub use sqlite::SqliteStore;
