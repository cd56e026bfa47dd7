// crates/sync-engine/src/merge.rs
//! Per-ownership-class conflict merge policies
//!
//! Merging is a pure function of the two conflicting records and the
//! ownership class; no remote calls happen here. The merged record adopts
//! the remote change tag so the follow-up save targets the version that was
//! just fetched.

use flightsync_core::{is_empty_value, ManagedRecord, OwnershipClass};
use std::collections::BTreeSet;

/// Merges a local record against the current remote version.
///
/// - Instructor-owned: owner-overwrite. The local content replaces the
///   remote content wholesale; only the remote's identity and version
///   housekeeping survive.
/// - Student-owned: the remote wins untouched; this engine never writes
///   those types.
/// - Bidirectional: field-level last-write-wins on the records' modified
///   timestamps, preferring non-empty values.
pub fn merge_on_conflict(
    ours: &ManagedRecord,
    theirs: &ManagedRecord,
    class: OwnershipClass,
) -> ManagedRecord {
    match class {
        OwnershipClass::InstructorOwned => owner_overwrite(ours, theirs),
        OwnershipClass::StudentOwned => theirs.clone(),
        OwnershipClass::Bidirectional => field_level_lww(ours, theirs),
    }
}

fn owner_overwrite(ours: &ManagedRecord, theirs: &ManagedRecord) -> ManagedRecord {
    let mut merged = theirs.clone();
    merged.fields = ours.fields.clone();
    merged.parent = ours.parent.clone();
    merged.modified_at = ours.modified_at;
    merged.modified_by = ours.modified_by;
    merged
}

fn field_level_lww(ours: &ManagedRecord, theirs: &ManagedRecord) -> ManagedRecord {
    let remote_newer = theirs.modified_at > ours.modified_at;

    let mut merged = ours.clone();
    merged.change_tag = theirs.change_tag;

    let keys: BTreeSet<&String> = ours.fields.keys().chain(theirs.fields.keys()).collect();
    for key in keys {
        let local = ours.fields.get(key);
        let remote = theirs.fields.get(key);

        let take_remote = (remote_newer && !is_empty_value(remote)) || is_empty_value(local);
        if take_remote {
            match remote {
                Some(value) => {
                    merged.fields.insert(key.clone(), value.clone());
                }
                None => {
                    merged.fields.remove(key);
                }
            }
        }
    }

    if remote_newer {
        merged.modified_at = theirs.modified_at;
        merged.modified_by = theirs.modified_by;
    }
    merged
}
