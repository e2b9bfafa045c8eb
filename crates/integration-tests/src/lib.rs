//! Shared fixtures for the cross-crate tests under `tests/`.

pub mod fixtures;
#[cfg(feature = "web-axum")]
pub mod http;
