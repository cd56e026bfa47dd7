// crates/queue/src/error.rs
//! Error types for the durable operation log

use thiserror::Error;

/// Result type for queue storage operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors that can occur in the durable operation log
#[derive(Debug, Error)]
pub enum QueueError {
    /// Database error with context
    #[error("{context}: {source}")]
    Database {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    /// A stored row has an unreadable payload or field
    #[error("Corrupt queue row {row_id}: {detail}")]
    CorruptRow { row_id: String, detail: String },

    /// Payload serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QueueError {
    /// Wraps a sqlx error with context
    pub fn database(context: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Database {
            context: context.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueueError::CorruptRow {
            row_id: "op-1".to_string(),
            detail: "bad kind".to_string(),
        };
        assert!(err.to_string().contains("op-1"));
    }
}
