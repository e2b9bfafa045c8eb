//! # DomainError
//!
//! Centralized error handling for the Marginalia ecosystem.
//! Maps store and validation failures to actionable error types.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The action needs a signed-in identity and there is none.
    #[error("authentication required")]
    NotAuthenticated,

    /// Input rejected before reaching a store (e.g., empty comment)
    #[error("validation error: {0}")]
    ValidationFailed(String),

    /// Infrastructure failure (e.g., DB down, unreadable content directory)
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The actor is not allowed to do this (e.g., deleting someone else's comment)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (e.g., Essay, Comment, Category)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Resource already exists (e.g., duplicate account email)
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::ValidationFailed(msg.into())
    }

    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        DomainError::StoreUnavailable(err.to_string())
    }

    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        DomainError::NotFound(kind.to_string(), id.to_string())
    }

    /// Message suitable for showing to the person who triggered the action.
    pub fn user_message(&self) -> String {
        match self {
            DomainError::NotAuthenticated => "Please sign in to continue.".to_string(),
            DomainError::ValidationFailed(msg) => msg.clone(),
            DomainError::StoreUnavailable(_) => {
                "Something went wrong on our side. Please try again.".to_string()
            }
            DomainError::Forbidden(_) => "You are not allowed to do that.".to_string(),
            DomainError::NotFound(kind, _) => format!("That {kind} could not be found."),
            DomainError::Conflict(msg) => msg.clone(),
        }
    }
}

/// A specialized Result type for Marginalia logic.
pub type Result<T> = std::result::Result<T, DomainError>;
