//! Shared Error Types
//!
//! This module defines error types that are shared between the services.
//! These errors represent failure cases that can occur when validating or
//! serializing data on any of the wire surfaces.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - Data validation failures
//!
//! # Usage
//!
//! ```rust
//! use relaychat::shared::error::SharedError;
//!
//! let error = SharedError::validation("content", "Message content cannot be empty.");
//! ```
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync` and can be safely shared across thread
//! boundaries.
use thiserror::Error;

/// Shared error types that can occur in any service
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The message as it should be surfaced to the offending connection
    pub fn user_message(&self) -> String {
        match self {
            Self::SerializationError { message } => message.clone(),
            Self::ValidationError { message, .. } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let error = SharedError::validation("content", "cannot be empty");
        assert_eq!(
            error.to_string(),
            "Validation error in field 'content': cannot be empty"
        );
    }

    #[test]
    fn test_user_message_drops_field() {
        let error = SharedError::validation("content", "cannot be empty");
        assert_eq!(error.user_message(), "cannot be empty");
    }
}
