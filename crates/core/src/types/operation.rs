// crates/core/src/types/operation.rs
//! Durable pending operations for the offline queue

use crate::types::common::{RecordId, StudentId};
use crate::types::record::RecordType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default attempt cap for a queued operation
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Kind of deferred mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    /// Create-or-update one or more records
    Save,
    /// Delete a record (and its substructure)
    Delete,
}

impl OperationKind {
    /// Wire name of the operation kind
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Save => "save",
            OperationKind::Delete => "delete",
        }
    }

    /// Parses a wire name back into an operation kind
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "save" => Some(OperationKind::Save),
            "delete" => Some(OperationKind::Delete),
            _ => None,
        }
    }
}

/// A durably persisted record of one deferred mutation.
///
/// Created when a push fails with a connectivity classification; replayed by
/// the offline queue once connectivity returns. Replay is keyed by the target
/// record identity so a retried push is a no-op update, never a duplicate
/// create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOperation {
    /// Operation identifier
    pub id: String,
    /// What to replay
    pub kind: OperationKind,
    /// Which student's namespace the mutation targets
    pub student: StudentId,
    /// Target record
    pub record_id: RecordId,
    /// Target record type
    pub record_type: RecordType,
    /// Serialized payload (the records to save, empty for deletes)
    pub payload: serde_json::Value,
    /// When the operation was queued
    pub created_at: DateTime<Utc>,
    /// Replay attempts so far
    pub attempts: u32,
    /// Attempt cap; at the cap the operation is surfaced, never dropped
    pub max_attempts: u32,
    /// True once the operation replayed successfully
    pub completed: bool,
}

impl PendingOperation {
    /// Creates a new pending operation with zero attempts
    pub fn new(
        kind: OperationKind,
        student: StudentId,
        record_id: RecordId,
        record_type: RecordType,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            student,
            record_id,
            record_type,
            payload,
            created_at: Utc::now(),
            attempts: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            completed: false,
        }
    }

    /// Sets a custom attempt cap
    pub fn with_max_attempts(mut self, cap: u32) -> Self {
        self.max_attempts = cap;
        self
    }

    /// Returns true if this operation has used up its attempt cap
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Returns true if the operation still needs replaying
    pub fn is_replayable(&self) -> bool {
        !self.completed && !self.is_exhausted()
    }

    /// Registers a failed replay attempt. The count never exceeds the cap.
    pub fn register_failure(&mut self) {
        if self.attempts < self.max_attempts {
            self.attempts += 1;
        }
    }

    /// Marks the operation as successfully replayed
    pub fn mark_complete(&mut self) {
        self.completed = true;
    }
}
