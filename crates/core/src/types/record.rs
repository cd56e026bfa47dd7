// crates/core/src/types/record.rs
//! The managed record model and its ownership classes

use crate::error::{CoreError, CoreResult};
use crate::types::common::{Actor, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which side's local copy wins when a record conflicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnershipClass {
    /// The instructor app is the sole writer; its copy always wins
    InstructorOwned,
    /// The student app is the sole writer; this engine only reads
    StudentOwned,
    /// Both sides write; merged field-by-field with last-write-wins
    Bidirectional,
}

/// Type tag of a managed record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A lesson assignment created by the instructor
    Assignment,
    /// Per-checklist-item completion state under an assignment
    ItemProgress,
    /// A training goal authored by the student
    TrainingGoal,
    /// A milestone the student recorded
    Milestone,
    /// The student's personal information record
    StudentProfile,
    /// An uploaded document (endorsement scan, medical, etc.)
    Document,
}

impl RecordType {
    /// The ownership class for this record type, fixed by the type tag
    pub fn ownership(&self) -> OwnershipClass {
        match self {
            RecordType::Assignment | RecordType::ItemProgress => OwnershipClass::InstructorOwned,
            RecordType::TrainingGoal | RecordType::Milestone => OwnershipClass::StudentOwned,
            RecordType::StudentProfile | RecordType::Document => OwnershipClass::Bidirectional,
        }
    }

    /// Wire name of this record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Assignment => "Assignment",
            RecordType::ItemProgress => "ItemProgress",
            RecordType::TrainingGoal => "TrainingGoal",
            RecordType::Milestone => "Milestone",
            RecordType::StudentProfile => "StudentProfile",
            RecordType::Document => "Document",
        }
    }

    /// Parses a wire name back into a record type
    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "Assignment" => Ok(RecordType::Assignment),
            "ItemProgress" => Ok(RecordType::ItemProgress),
            "TrainingGoal" => Ok(RecordType::TrainingGoal),
            "Milestone" => Ok(RecordType::Milestone),
            "StudentProfile" => Ok(RecordType::StudentProfile),
            "Document" => Ok(RecordType::Document),
            other => Err(CoreError::UnknownRecordType(other.to_string())),
        }
    }

    /// All record types, children before parents.
    ///
    /// This is the order cascading deletes must follow.
    pub fn deletion_order() -> [RecordType; 6] {
        [
            RecordType::ItemProgress,
            RecordType::Assignment,
            RecordType::TrainingGoal,
            RecordType::Milestone,
            RecordType::Document,
            RecordType::StudentProfile,
        ]
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed, versioned record living inside a shared namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedRecord {
    /// Record identifier
    pub id: RecordId,
    /// Record type tag
    pub record_type: RecordType,
    /// Parent record for hierarchical cascade, if any
    pub parent: Option<RecordId>,
    /// Content fields
    pub fields: BTreeMap<String, serde_json::Value>,
    /// Last-modified timestamp
    pub modified_at: DateTime<Utc>,
    /// Which side last modified the record
    pub modified_by: Actor,
    /// Version token checked by the remote store on write
    pub change_tag: u64,
}

impl ManagedRecord {
    /// Creates a new record with an empty field map
    pub fn new(id: RecordId, record_type: RecordType, modified_by: Actor) -> Self {
        Self {
            id,
            record_type,
            parent: None,
            fields: BTreeMap::new(),
            modified_at: Utc::now(),
            modified_by,
            change_tag: 0,
        }
    }

    /// Sets the parent record reference
    pub fn with_parent(mut self, parent: RecordId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets a content field
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Gets a content field
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    /// Gets a required field or a typed error naming the record
    pub fn require_field(&self, key: &str) -> CoreResult<&serde_json::Value> {
        self.fields.get(key).ok_or_else(|| CoreError::MissingField {
            record_id: self.id.to_string(),
            field: key.to_string(),
        })
    }

    /// Returns true if this record was modified after another
    pub fn is_newer_than(&self, other: &ManagedRecord) -> bool {
        self.modified_at > other.modified_at
    }

    /// The ownership class of this record
    pub fn ownership(&self) -> OwnershipClass {
        self.record_type.ownership()
    }
}

/// Returns true if a field value counts as empty for merge purposes.
///
/// Absent keys, nulls and empty strings are all "empty"; everything else,
/// including `0` and `false`, is a real value.
pub fn is_empty_value(value: Option<&serde_json::Value>) -> bool {
    match value {
        None => true,
        Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}
