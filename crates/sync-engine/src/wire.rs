// crates/sync-engine/src/wire.rs
//! Conversion between local entities and managed records
//!
//! Record identifiers crossing the share are deterministic functions of the
//! entity identity (assignment ID plus ordinal for items, the well-known
//! root ID for profiles), so a replayed push updates the same record instead
//! of creating a duplicate.

use chrono::{DateTime, Utc};
use flightsync_core::{
    Actor, Assignment, CoreResult, DocumentMeta, ItemState, ManagedRecord, Milestone, RecordId,
    RecordType, StudentId, StudentProfile, TrainingGoal,
};
use flightsync_library::{IdentifierResolver, LibraryChecklist};
use serde_json::json;

/// The deterministic record ID for one checklist item of an assignment
pub fn item_record_id(assignment: &RecordId, ordinal: u32) -> RecordId {
    RecordId::from_string(format!("{}-item-{}", assignment, ordinal))
}

/// The ordinals a complete assignment must carry.
///
/// When the template exists in the reference library the library checklist
/// defines the full set; otherwise the assignment's own items are all we
/// know about.
pub fn expected_ordinals(assignment: &Assignment, checklist: Option<&LibraryChecklist>) -> Vec<u32> {
    match checklist {
        Some(checklist) => checklist
            .items_by_ordinal()
            .iter()
            .map(|item| item.ordinal)
            .collect(),
        None => {
            let mut ordinals: Vec<u32> = assignment.items.iter().map(|i| i.ordinal).collect();
            ordinals.sort_unstable();
            ordinals.dedup();
            ordinals
        }
    }
}

/// Returns a copy of the assignment with every expected item present,
/// synthesizing missing ones in default incomplete state. A push always
/// carries the complete substructure.
pub fn with_complete_substructure(
    assignment: &Assignment,
    checklist: Option<&LibraryChecklist>,
) -> Assignment {
    let mut complete = assignment.clone();
    for ordinal in expected_ordinals(assignment, checklist) {
        if !complete.items.iter().any(|i| i.ordinal == ordinal) {
            complete.items.push(ItemState::incomplete(ordinal));
        }
    }
    complete.items.sort_by_key(|i| i.ordinal);
    complete
}

/// Serializes an assignment into its parent record and child item records
pub fn assignment_to_records(
    assignment: &Assignment,
    resolver: &IdentifierResolver<'_>,
    actor: Actor,
) -> (ManagedRecord, Vec<ManagedRecord>) {
    let template_id = resolver
        .template_id_or_fallback(&assignment.template_stable_id, &assignment.local_template_id)
        .to_string();

    let mut parent = ManagedRecord::new(assignment.id.clone(), RecordType::Assignment, actor)
        .with_field("student", json!(assignment.student.as_str()))
        .with_field("template", json!(template_id))
        .with_field("template_stable_id", json!(assignment.template_stable_id))
        .with_field("assigned_at", json!(assignment.assigned_at.to_rfc3339()))
        .with_field("item_count", json!(assignment.items.len()));
    parent.modified_at = assignment.updated_at;

    let children = assignment
        .items
        .iter()
        .map(|item| {
            let owner_item_id =
                format!("{}-item-{}", assignment.local_template_id, item.ordinal);
            let item_id = resolver
                .item_id_or_fallback(&assignment.template_stable_id, item.ordinal, &owner_item_id)
                .to_string();

            let mut record = ManagedRecord::new(
                item_record_id(&assignment.id, item.ordinal),
                RecordType::ItemProgress,
                actor,
            )
            .with_parent(assignment.id.clone())
            .with_field("ordinal", json!(item.ordinal))
            .with_field("item", json!(item_id))
            .with_field("completed", json!(item.completed))
            .with_field("notes", json!(item.notes));
            record.modified_at = item.updated_at;
            record
        })
        .collect();

    (parent, children)
}

/// Serializes the student profile into the namespace's root record
pub fn profile_to_record(profile: &StudentProfile, actor: Actor) -> ManagedRecord {
    let mut record = ManagedRecord::new(
        RecordId::root_for(&profile.student),
        RecordType::StudentProfile,
        actor,
    )
    .with_field("name", json!(profile.name))
    .with_field("email", json!(profile.email))
    .with_field("phone", json!(profile.phone))
    .with_field("certificate_number", json!(profile.certificate_number));
    record.modified_at = profile.updated_at;
    record
}

/// Maps the root record back to a student profile
pub fn profile_from_record(record: &ManagedRecord, student: &StudentId) -> CoreResult<StudentProfile> {
    Ok(StudentProfile {
        student: student.clone(),
        name: string_field(record, "name")?,
        email: optional_string(record, "email"),
        phone: optional_string(record, "phone"),
        certificate_number: optional_string(record, "certificate_number"),
        updated_at: record.modified_at,
    })
}

/// Serializes document metadata; the binary travels separately as an asset
pub fn document_to_record(doc: &DocumentMeta, actor: Actor) -> ManagedRecord {
    let mut record = ManagedRecord::new(doc.id.clone(), RecordType::Document, actor)
        .with_field("student", json!(doc.student.as_str()))
        .with_field("title", json!(doc.title))
        .with_field("file_name", json!(doc.file_name))
        .with_field("byte_size", json!(doc.byte_size));
    record.modified_at = doc.updated_at;
    record
}

/// Maps a document record back to metadata
pub fn document_from_record(record: &ManagedRecord, student: &StudentId) -> CoreResult<DocumentMeta> {
    Ok(DocumentMeta {
        id: record.id.clone(),
        student: student.clone(),
        title: string_field(record, "title")?,
        file_name: string_field(record, "file_name")?,
        byte_size: record
            .field("byte_size")
            .and_then(|v| v.as_u64())
            .unwrap_or(0),
        updated_at: record.modified_at,
    })
}

/// Maps a student-owned training goal record to its entity
pub fn goal_from_record(record: &ManagedRecord, student: &StudentId) -> CoreResult<TrainingGoal> {
    Ok(TrainingGoal {
        id: record.id.clone(),
        student: student.clone(),
        title: string_field(record, "title")?,
        target_date: optional_string(record, "target_date")
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        achieved: record
            .field("achieved")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        updated_at: record.modified_at,
    })
}

/// Maps a student-owned milestone record to its entity
pub fn milestone_from_record(record: &ManagedRecord, student: &StudentId) -> CoreResult<Milestone> {
    let achieved_at = string_field(record, "achieved_at")?;
    let achieved_at = DateTime::parse_from_rfc3339(&achieved_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| flightsync_core::CoreError::MissingField {
            record_id: record.id.to_string(),
            field: "achieved_at".to_string(),
        })?;

    Ok(Milestone {
        id: record.id.clone(),
        student: student.clone(),
        title: string_field(record, "title")?,
        achieved_at,
        updated_at: record.modified_at,
    })
}

fn string_field(record: &ManagedRecord, key: &str) -> CoreResult<String> {
    let value = record.require_field(key)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| flightsync_core::CoreError::MissingField {
            record_id: record.id.to_string(),
            field: key.to_string(),
        })
}

fn optional_string(record: &ManagedRecord, key: &str) -> Option<String> {
    record
        .field(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightsync_library::ReferenceLibrary;

    fn assignment(items: Vec<ItemState>) -> Assignment {
        Assignment {
            id: RecordId::from_string("assignment-1"),
            student: StudentId::from_string("s-1"),
            template_stable_id: "PPL-S1-L1".to_string(),
            local_template_id: "local-tpl-9".to_string(),
            items,
            assigned_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_substructure_synthesis_fills_missing_items() {
        let library = ReferenceLibrary::bundled().unwrap();
        let checklist = library.checklist_by_stable_id("PPL-S1-L1");

        // Only item 3 exists locally; the library checklist has five
        let sparse = assignment(vec![ItemState {
            ordinal: 3,
            completed: true,
            notes: None,
            updated_at: Utc::now(),
        }]);

        let complete = with_complete_substructure(&sparse, checklist);
        assert_eq!(complete.items.len(), 5);
        let completed: Vec<bool> = complete.items.iter().map(|i| i.completed).collect();
        assert_eq!(completed, vec![false, false, true, false, false]);
    }

    #[test]
    fn test_substructure_without_library_keeps_own_items() {
        let sparse = assignment(vec![
            ItemState::incomplete(1),
            ItemState::incomplete(4),
        ]);
        let complete = with_complete_substructure(&sparse, None);
        let ordinals: Vec<u32> = complete.items.iter().map(|i| i.ordinal).collect();
        assert_eq!(ordinals, vec![1, 4]);
    }

    #[test]
    fn test_assignment_records_resolve_library_ids() {
        let library = ReferenceLibrary::bundled().unwrap();
        let resolver = IdentifierResolver::new(library);

        let a = assignment(vec![ItemState::incomplete(1), ItemState::incomplete(2)]);
        let (parent, children) = assignment_to_records(&a, &resolver, Actor::Instructor);

        assert_eq!(parent.field("template").unwrap(), "lib-ppl-s1-l1");
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].field("item").unwrap(), "lib-ppl-s1-l1-i1");
        assert_eq!(children[0].parent, Some(a.id.clone()));
    }

    #[test]
    fn test_assignment_records_fall_back_to_owner_ids() {
        let library = ReferenceLibrary::bundled().unwrap();
        let resolver = IdentifierResolver::new(library);

        let mut a = assignment(vec![ItemState::incomplete(1)]);
        a.template_stable_id = "CUSTOM-TAILWHEEL-1".to_string();
        let (parent, children) = assignment_to_records(&a, &resolver, Actor::Instructor);

        assert_eq!(parent.field("template").unwrap(), "local-tpl-9");
        assert_eq!(children[0].field("item").unwrap(), "local-tpl-9-item-1");
    }

    #[test]
    fn test_item_record_ids_deterministic() {
        let a = RecordId::from_string("assignment-1");
        assert_eq!(item_record_id(&a, 3), item_record_id(&a, 3));
        assert_ne!(item_record_id(&a, 3), item_record_id(&a, 4));
    }

    #[test]
    fn test_profile_roundtrip() {
        let student = StudentId::from_string("s-1");
        let profile = StudentProfile {
            student: student.clone(),
            name: "Jamie Rivera".to_string(),
            email: Some("jamie@example.com".to_string()),
            phone: None,
            certificate_number: None,
            updated_at: Utc::now(),
        };

        let record = profile_to_record(&profile, Actor::Instructor);
        assert_eq!(record.id, RecordId::root_for(&student));

        let back = profile_from_record(&record, &student).unwrap();
        assert_eq!(back.name, profile.name);
        assert_eq!(back.email, profile.email);
        assert_eq!(back.phone, None);
    }

    #[test]
    fn test_goal_from_malformed_record() {
        let student = StudentId::from_string("s-1");
        let record = ManagedRecord::new(
            RecordId::from_string("goal-1"),
            RecordType::TrainingGoal,
            Actor::Student,
        );
        // No title field
        assert!(goal_from_record(&record, &student).is_err());
    }

    #[test]
    fn test_milestone_from_record() {
        let student = StudentId::from_string("s-1");
        let record = ManagedRecord::new(
            RecordId::from_string("ms-1"),
            RecordType::Milestone,
            Actor::Student,
        )
        .with_field("title", json!("First solo"))
        .with_field("achieved_at", json!(Utc::now().to_rfc3339()));

        let ms = milestone_from_record(&record, &student).unwrap();
        assert_eq!(ms.title, "First solo");
    }
}
