// crates/core/src/types/entity.rs
//! Local entities handed to the synchronizer by the local store.
//!
//! These are snapshots of the instructor app's object graph. The synchronizer
//! turns them into managed records on push and writes merged results back
//! through the local store's atomic save.

use crate::types::common::{RecordId, StudentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Completion state of one checklist item within an assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemState {
    /// Ordinal position within the instructor's checklist
    pub ordinal: u32,
    /// Whether the student completed this item
    pub completed: bool,
    /// Instructor notes for the item
    pub notes: Option<String>,
    /// When this item state last changed
    pub updated_at: DateTime<Utc>,
}

impl ItemState {
    /// A default, incomplete item at the given ordinal.
    ///
    /// Used to synthesize missing substructure before an assignment push.
    pub fn incomplete(ordinal: u32) -> Self {
        Self {
            ordinal,
            completed: false,
            notes: None,
            updated_at: Utc::now(),
        }
    }
}

/// A lesson assignment, instructor-owned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: RecordId,
    pub student: StudentId,
    /// Stable human-readable identifier of the checklist template
    /// (e.g. a lesson code like "PPL-S1-L3")
    pub template_stable_id: String,
    /// Locally generated identifier of the instructor's own template copy
    pub local_template_id: String,
    /// Item states present locally; may be a subset of the template
    pub items: Vec<ItemState>,
    pub assigned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The student's personal information record, editable on both sides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub student: StudentId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub certificate_number: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// A training goal authored by the student; read-only on this side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingGoal {
    pub id: RecordId,
    pub student: StudentId,
    pub title: String,
    pub target_date: Option<DateTime<Utc>>,
    pub achieved: bool,
    pub updated_at: DateTime<Utc>,
}

/// A milestone the student recorded; read-only on this side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: RecordId,
    pub student: StudentId,
    pub title: String,
    pub achieved_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadata for an uploaded document; the binary itself travels as an asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub id: RecordId,
    pub student: StudentId,
    pub title: String,
    pub file_name: String,
    pub byte_size: u64,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_item() {
        let item = ItemState::incomplete(3);
        assert_eq!(item.ordinal, 3);
        assert!(!item.completed);
        assert!(item.notes.is_none());
    }
}
