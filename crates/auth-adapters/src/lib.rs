//! # auth-adapters
//!
//! Argon2-based implementation of `AccountProvider`.
//! Handles email/password accounts over an `AccountStore` and cookie
//! session tokens.

pub mod password;
pub mod sessions;

pub use sessions::{SessionAccounts, MIN_PASSWORD_LEN};
