// crates/core/src/lib.rs
//! Core types shared across the FlightSync workspace
//!
//! This crate defines the vocabulary the sync engine speaks:
//! - Newtype identifiers for students, records and namespaces
//! - The managed record model and its ownership classes
//! - The shared namespace and its acceptance lifecycle
//! - The pending operation model for the offline queue

mod error;
mod types;

pub use error::{CoreError, CoreResult};
pub use types::common::{Actor, NamespaceId, RecordId, StudentId};
pub use types::entity::{Assignment, DocumentMeta, ItemState, Milestone, StudentProfile, TrainingGoal};
pub use types::namespace::{AcceptanceState, SharedNamespace};
pub use types::operation::{OperationKind, PendingOperation, DEFAULT_MAX_ATTEMPTS};
pub use types::record::{is_empty_value, ManagedRecord, OwnershipClass, RecordType};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        // Verify all types are exported
        let student = StudentId::new();
        let _: RecordId = RecordId::new();
        let _: NamespaceId = NamespaceId::for_student(&student);
        let _: SharedNamespace = SharedNamespace::new(student, "owner".to_string());
    }
}
