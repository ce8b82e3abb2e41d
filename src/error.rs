//! Error types for Notion Notes.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias for notes operations
pub type NotesResult<T> = Result<T, NotesError>;

/// Main error type for notes operations
#[derive(Error, Debug)]
pub enum NotesError {
    /// Missing or malformed caller input. `message` is shown to the caller as-is.
    #[error("{message}")]
    Validation { field: String, message: String },

    /// The document-database service answered with an error.
    #[error("{message}")]
    External {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    /// Network or decode failure on the UI side of the app's own API.
    #[error("{0}")]
    ClientFetch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NotesError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        NotesError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an external-service error carrying only a message
    pub fn external(message: impl Into<String>) -> Self {
        NotesError::External {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    /// Create a new client fetch error
    pub fn client_fetch(message: impl Into<String>) -> Self {
        NotesError::ClientFetch(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, NotesError::Validation { .. })
    }
}

impl From<reqwest::Error> for NotesError {
    fn from(err: reqwest::Error) -> Self {
        NotesError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notes_error_validation_shows_static_message() {
        let err = NotesError::validation("id", "No ID provided");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "No ID provided");
    }

    #[test]
    fn test_external_error_passes_message_verbatim() {
        let err = NotesError::External {
            status: Some(404),
            code: Some("object_not_found".to_string()),
            message: "Could not find page with ID: abc.".to_string(),
        };
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "Could not find page with ID: abc.");
    }

    #[test]
    fn test_validation_error_keeps_field() {
        let err = NotesError::validation("searchQuery", "Search query is required");
        assert!(matches!(err, NotesError::Validation { ref field, .. } if field == "searchQuery"));
    }
}
