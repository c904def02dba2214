//! Common error types for SCF Music

use std::collections::BTreeMap;
use thiserror::Error;

/// Common result type for SCF Music operations
pub type Result<T> = std::result::Result<T, Error>;

/// Per-field validation messages, keyed by field name
pub type FieldErrors = BTreeMap<String, String>;

/// Common error types across SCF Music crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding of stored columns
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// One or more form fields failed validation
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(FieldErrors),

    /// Status change not allowed from the current state
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Ticket no longer accepts replies
    #[error("Ticket is closed")]
    TicketClosed,

    /// Stale write or uniqueness violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad credentials, banned account, missing or revoked session
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a validation error holding a single field message
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), message.into());
        Error::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_counts_fields() {
        let mut errors = FieldErrors::new();
        errors.insert("song_title".to_string(), "Song title is required.".to_string());
        errors.insert("genre".to_string(), "Genre is required.".to_string());
        let err = Error::Validation(errors);
        assert_eq!(err.to_string(), "Validation failed for 2 field(s)");
    }

    #[test]
    fn test_field_helper() {
        match Error::field("artwork", "Artwork is required.") {
            Error::Validation(map) => {
                assert_eq!(map.get("artwork").map(String::as_str), Some("Artwork is required."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
