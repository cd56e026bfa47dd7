// crates/sync-engine/src/error.rs
//! Error types for sync operations

use flightsync_core::CoreError;
use flightsync_library::LibraryError;
use flightsync_queue::QueueError;
use flightsync_resilience::RetriesExhausted;
use flightsync_store::StoreError;
use thiserror::Error;

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during synchronization
#[derive(Debug, Error)]
pub enum SyncError {
    /// Classified remote store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Durable queue storage failure
    #[error("Queue storage error: {0}")]
    Queue(#[from] QueueError),

    /// Reference library failure
    #[error("Reference library error: {0}")]
    Library(#[from] LibraryError),

    /// Record model failure
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Conflict resolution gave up after re-fetching and re-merging
    #[error("Conflict on record {record_id} unresolved after {attempts} attempts")]
    ConflictUnresolved { record_id: String, attempts: u32 },

    /// The student's share was terminated; a new namespace is required
    #[error("Share for student {0} was terminated; re-link to share again")]
    ShareTerminated(String),

    /// A sync pass for this student is already running
    #[error("Sync already in progress for student {0}")]
    SyncInProgress(String),

    /// An asset exceeds the store's per-asset size limit
    #[error("Asset '{name}' is {size} bytes, over the {limit}-byte limit")]
    AssetTooLarge { name: String, size: u64, limit: u64 },
}

impl SyncError {
    /// Returns true if the failure was a connectivity classification, which
    /// means the mutation should be queued for replay
    pub fn is_connectivity(&self) -> bool {
        matches!(self, SyncError::Store(e) if e.is_retryable())
    }

    /// A remediation hint for user-facing surfaces, where one exists
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            SyncError::Store(e) => e.remediation(),
            SyncError::ShareTerminated(_) => Some("Create a new share link for this student"),
            _ => None,
        }
    }
}

impl From<RetriesExhausted<StoreError>> for SyncError {
    fn from(err: RetriesExhausted<StoreError>) -> Self {
        SyncError::Store(err.into_source())
    }
}
