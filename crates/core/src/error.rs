// crates/core/src/error.rs
//! Error types for the core record model

use thiserror::Error;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the core record model
#[derive(Debug, Error)]
pub enum CoreError {
    /// A namespace acceptance state transition that would move backwards
    /// or leave the terminal state
    #[error("Invalid acceptance transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// A record is missing a field required by its type
    #[error("Record {record_id} is missing required field '{field}'")]
    MissingField { record_id: String, field: String },

    /// A record type tag that no known type matches
    #[error("Unknown record type tag: {0}")]
    UnknownRecordType(String),

    /// An identifier that could not be parsed
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::InvalidTransition {
            from: "Terminated".to_string(),
            to: "Accepted".to_string(),
        };
        assert!(err.to_string().contains("Invalid acceptance transition"));
    }

    #[test]
    fn test_missing_field_error() {
        let err = CoreError::MissingField {
            record_id: "rec-1".to_string(),
            field: "template".to_string(),
        };
        assert!(err.to_string().contains("template"));
    }
}
