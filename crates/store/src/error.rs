// crates/store/src/error.rs
//! The closed error taxonomy at the store boundary
//!
//! Every failure a store implementation surfaces is classified into exactly
//! one of five categories. The synchronizer and the offline queue key their
//! retry and enqueue decisions off this classification; nothing downstream
//! ever inspects a vendor error type.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Why an operation was not authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthReason {
    /// No account is signed in on this device
    NotSignedIn,
    /// The account lacks permission for the target namespace
    PermissionDenied,
    /// The account's remote storage quota is exhausted
    QuotaExceeded,
}

impl AuthReason {
    /// A specific remediation hint for the user
    pub fn remediation(&self) -> &'static str {
        match self {
            AuthReason::NotSignedIn => "Sign in to your cloud account in system settings",
            AuthReason::PermissionDenied => {
                "Ask the namespace owner to re-share, or re-link the student"
            }
            AuthReason::QuotaExceeded => "Free up cloud storage or upgrade the storage plan",
        }
    }
}

impl std::fmt::Display for AuthReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuthReason::NotSignedIn => "not signed in",
            AuthReason::PermissionDenied => "permission denied",
            AuthReason::QuotaExceeded => "quota exceeded",
        };
        write!(f, "{}", s)
    }
}

/// Classified errors from the remote object store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network unreachable or service unavailable; retryable, then queued
    #[error("Store unreachable: {0}")]
    Connectivity(String),

    /// Stale version on write; resolved locally by merge policy
    #[error("Version conflict on record {record_id}")]
    Conflict { record_id: String },

    /// Remote schema/type not deployed in this environment; fatal to the
    /// operation and actionable as a configuration problem
    #[error("Record type '{record_type}' is not provisioned in the remote schema")]
    Provisioning { record_type: String },

    /// Permission, sign-in or quota problem; fatal with a remediation hint
    #[error("Not authorized: {reason}")]
    Authorization { reason: AuthReason },

    /// A fetched record is missing required data; skipped, never aborts a
    /// batch
    #[error("Malformed record {record_id}: {detail}")]
    Malformed { record_id: String, detail: String },
}

impl StoreError {
    /// Returns true if a bounded retry may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Connectivity(_))
    }

    /// Returns true for a stale-version write rejection
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// Returns true if the single offending record can be skipped without
    /// failing the surrounding batch
    pub fn is_skippable(&self) -> bool {
        matches!(self, StoreError::Malformed { .. })
    }

    /// A remediation hint, where the category has one
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            StoreError::Authorization { reason } => Some(reason.remediation()),
            StoreError::Provisioning { .. } => {
                Some("Deploy the record schema to this environment before syncing")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_connectivity_is_retryable() {
        assert!(StoreError::Connectivity("offline".into()).is_retryable());
        assert!(!StoreError::Conflict { record_id: "r".into() }.is_retryable());
        assert!(!StoreError::Provisioning { record_type: "Assignment".into() }.is_retryable());
        assert!(!StoreError::Authorization { reason: AuthReason::NotSignedIn }.is_retryable());
        assert!(!StoreError::Malformed { record_id: "r".into(), detail: "d".into() }.is_retryable());
    }

    #[test]
    fn test_conflict_classification() {
        let err = StoreError::Conflict { record_id: "rec-1".into() };
        assert!(err.is_conflict());
        assert!(!err.is_skippable());
    }

    #[test]
    fn test_malformed_is_skippable() {
        let err = StoreError::Malformed {
            record_id: "rec-1".into(),
            detail: "missing 'template'".into(),
        };
        assert!(err.is_skippable());
    }

    #[test]
    fn test_remediation_hints() {
        let err = StoreError::Authorization { reason: AuthReason::QuotaExceeded };
        assert!(err.remediation().unwrap().contains("storage"));

        let err = StoreError::Provisioning { record_type: "Assignment".into() };
        assert!(err.remediation().unwrap().contains("schema"));

        assert!(StoreError::Connectivity("x".into()).remediation().is_none());
    }
}
