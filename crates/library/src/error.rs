// crates/library/src/error.rs
//! Error types for reference library loading

use thiserror::Error;

/// Result type for library operations
pub type LibraryResult<T> = Result<T, LibraryError>;

/// Errors that can occur loading the reference library
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The catalog could not be parsed
    #[error("Failed to parse reference catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// The catalog parsed but contains no checklists
    #[error("Reference catalog is empty")]
    EmptyCatalog,

    /// A checklist has a duplicate stable identifier
    #[error("Duplicate stable identifier in catalog: {0}")]
    DuplicateStableId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LibraryError::DuplicateStableId("PPL-S1-L1".to_string());
        assert!(err.to_string().contains("PPL-S1-L1"));
    }
}
