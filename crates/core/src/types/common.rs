// crates/core/src/types/common.rs
//! Identifier newtypes and the actor tag

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique student identifier, generated locally by the instructor app
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentId(String);

impl StudentId {
    /// Creates a new random student ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates a student ID from a string
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the student ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StudentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a managed record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new random record ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates a record ID from a string
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The well-known root record ID for a student's namespace.
    ///
    /// Both apps derive the same ID, so the counterpart can locate a
    /// namespace by probing for this record.
    pub fn root_for(student: &StudentId) -> Self {
        Self(format!("profile-{}", student.as_str()))
    }

    /// Returns the record ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a shared namespace (zone) in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceId(String);

impl NamespaceId {
    /// The canonical namespace name for a student
    pub fn for_student(student: &StudentId) -> Self {
        Self(format!("student-{}", student.as_str()))
    }

    /// Creates a namespace ID from a raw zone name
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the namespace ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the share last modified a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    /// The instructor app
    Instructor,
    /// The student companion app
    Student,
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Instructor => write!(f, "instructor"),
            Actor::Student => write!(f, "student"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_id_uniqueness() {
        let id1 = StudentId::new();
        let id2 = StudentId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_record_id_from_string() {
        let id = RecordId::from_string("rec-123");
        assert_eq!(id.as_str(), "rec-123");
    }

    #[test]
    fn test_root_record_id_is_deterministic() {
        let student = StudentId::from_string("s-1");
        assert_eq!(RecordId::root_for(&student), RecordId::root_for(&student));
        assert_eq!(RecordId::root_for(&student).as_str(), "profile-s-1");
    }

    #[test]
    fn test_namespace_for_student() {
        let student = StudentId::from_string("s-1");
        let ns = NamespaceId::for_student(&student);
        assert_eq!(ns.as_str(), "student-s-1");
    }

    #[test]
    fn test_actor_display() {
        assert_eq!(Actor::Instructor.to_string(), "instructor");
        assert_eq!(Actor::Student.to_string(), "student");
    }
}
