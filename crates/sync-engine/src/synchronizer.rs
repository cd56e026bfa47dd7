// crates/sync-engine/src/synchronizer.rs
//! Record push/pull with conflict resolution
//!
//! Every push runs through bounded retry for connectivity blips, then through
//! the merge loop for version conflicts: re-fetch the remote copy, merge per
//! the record's ownership class, save the merged record. The loop is bounded;
//! a record that keeps conflicting surfaces as `ConflictUnresolved`.

use crate::error::{SyncError, SyncResult};
use crate::merge::merge_on_conflict;
use crate::wire;
use flightsync_core::{
    Actor, Assignment, DocumentMeta, ManagedRecord, Milestone, NamespaceId, RecordId, RecordType,
    StudentId, StudentProfile, TrainingGoal,
};
use flightsync_library::{IdentifierResolver, ReferenceLibrary};
use flightsync_resilience::{with_retry, RetryPolicy};
use flightsync_store::{
    Asset, RecordQuery, RemoteStore, StoreError, StoreResult, MAX_ASSET_BYTES, MAX_BATCH_RECORDS,
};
use std::future::Future;
use std::sync::Arc;

/// How many fetch-merge-save rounds a conflicting record gets before the
/// push gives up
const MAX_MERGE_ATTEMPTS: u32 = 3;

/// Pushes and pulls managed records through a remote store
pub struct RecordSynchronizer<S> {
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<S: RemoteStore> RecordSynchronizer<S> {
    /// Creates a synchronizer over a store
    pub fn new(store: Arc<S>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    async fn retried<T, F, Fut>(&self, op: F) -> Result<T, StoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        with_retry(&self.retry, op, StoreError::is_retryable)
            .await
            .map_err(|e| e.into_source())
    }

    /// Pushes one record, resolving version conflicts by fetching the
    /// current remote copy and merging per the record's ownership class.
    /// Returns the stored copy with its updated change tag.
    pub async fn push_record(
        &self,
        zone: &NamespaceId,
        record: &ManagedRecord,
    ) -> SyncResult<ManagedRecord> {
        let mut candidate = record.clone();

        for attempt in 0..=MAX_MERGE_ATTEMPTS {
            let saved = self.retried(|| self.store.save_record(zone, &candidate)).await;
            match saved {
                Ok(stored) => return Ok(stored),
                Err(e) if e.is_conflict() && attempt < MAX_MERGE_ATTEMPTS => {
                    log::debug!(
                        "conflict on {} (attempt {}), merging",
                        candidate.id,
                        attempt + 1
                    );
                    let remote = self
                        .retried(|| self.store.fetch_record(zone, &candidate.id))
                        .await?;
                    candidate = match remote {
                        Some(remote) => merge_on_conflict(
                            record,
                            &remote,
                            record.record_type.ownership(),
                        ),
                        None => {
                            // Deleted out from under us; recreate fresh
                            let mut fresh = record.clone();
                            fresh.change_tag = 0;
                            fresh
                        }
                    };
                }
                Err(e) if e.is_conflict() => {
                    return Err(SyncError::ConflictUnresolved {
                        record_id: record.id.to_string(),
                        attempts: MAX_MERGE_ATTEMPTS,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(SyncError::ConflictUnresolved {
            record_id: record.id.to_string(),
            attempts: MAX_MERGE_ATTEMPTS,
        })
    }

    /// Pushes a set of records in batches under the store's batch cap. A
    /// batch that fails with a conflict falls back to per-record pushes so
    /// one stale record cannot block its siblings.
    pub async fn push_batch(
        &self,
        zone: &NamespaceId,
        records: &[ManagedRecord],
    ) -> SyncResult<Vec<ManagedRecord>> {
        let mut stored = Vec::with_capacity(records.len());

        for chunk in records.chunks(MAX_BATCH_RECORDS) {
            match self.retried(|| self.store.save_records(zone, chunk)).await {
                Ok(mut batch) => stored.append(&mut batch),
                Err(e) if e.is_conflict() => {
                    log::debug!("batch conflict in {}, retrying record by record", zone);
                    for record in chunk {
                        stored.push(self.push_record(zone, record).await?);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(stored)
    }

    /// Pushes an assignment with its complete item substructure in one
    /// batch. Missing items are synthesized in default incomplete state from
    /// the reference library checklist, so the counterpart always sees the
    /// full checklist.
    pub async fn push_assignment(
        &self,
        zone: &NamespaceId,
        assignment: &Assignment,
        library: &ReferenceLibrary,
        actor: Actor,
    ) -> SyncResult<()> {
        let checklist = library.checklist_by_stable_id(&assignment.template_stable_id);
        let complete = wire::with_complete_substructure(assignment, checklist);

        let resolver = IdentifierResolver::new(library);
        let (parent, children) = wire::assignment_to_records(&complete, &resolver, actor);

        let mut records = Vec::with_capacity(children.len() + 1);
        records.push(parent);
        records.extend(children);
        self.push_batch(zone, &records).await?;
        Ok(())
    }

    /// Pushes the student profile root record
    pub async fn push_profile(
        &self,
        zone: &NamespaceId,
        profile: &StudentProfile,
        actor: Actor,
    ) -> SyncResult<()> {
        let record = wire::profile_to_record(profile, actor);
        self.push_record(zone, &record).await?;
        Ok(())
    }

    /// Pushes document metadata and attaches the binary as an asset. The
    /// asset size is checked locally before any remote call so an oversized
    /// document fails fast without a partial write.
    pub async fn push_document(
        &self,
        zone: &NamespaceId,
        doc: &DocumentMeta,
        asset: Option<&Asset>,
        actor: Actor,
    ) -> SyncResult<()> {
        if let Some(asset) = asset {
            if asset.byte_size() > MAX_ASSET_BYTES {
                return Err(SyncError::AssetTooLarge {
                    name: asset.name.clone(),
                    size: asset.byte_size(),
                    limit: MAX_ASSET_BYTES,
                });
            }
        }

        let record = wire::document_to_record(doc, actor);
        let stored = self.push_record(zone, &record).await?;

        if let Some(asset) = asset {
            self.retried(|| self.store.attach_asset(zone, &stored.id, asset))
                .await?;
        }
        Ok(())
    }

    /// Deletes an assignment and its item records, children first so a
    /// partial failure never leaves orphaned items without a parent
    pub async fn delete_assignment(
        &self,
        zone: &NamespaceId,
        assignment: &RecordId,
    ) -> SyncResult<()> {
        let query = RecordQuery::of_type(RecordType::ItemProgress).with_parent(assignment.clone());
        let children = self.retried(|| self.store.query_records(zone, &query)).await?;

        for child in &children {
            self.retried(|| self.store.delete_record(zone, &child.id))
                .await?;
        }
        self.retried(|| self.store.delete_record(zone, assignment))
            .await?;
        Ok(())
    }

    /// Pulls the student's training goals. A malformed record is logged and
    /// skipped; it never aborts the rest of the pull.
    pub async fn pull_goals(
        &self,
        zone: &NamespaceId,
        student: &StudentId,
    ) -> SyncResult<Vec<TrainingGoal>> {
        let query = RecordQuery::of_type(RecordType::TrainingGoal);
        let records = self.retried(|| self.store.query_records(zone, &query)).await?;

        let mut goals = Vec::with_capacity(records.len());
        for record in &records {
            match wire::goal_from_record(record, student) {
                Ok(goal) => goals.push(goal),
                Err(e) => log::warn!("skipping malformed goal record {}: {}", record.id, e),
            }
        }
        Ok(goals)
    }

    /// Pulls the student's milestones, skipping malformed records
    pub async fn pull_milestones(
        &self,
        zone: &NamespaceId,
        student: &StudentId,
    ) -> SyncResult<Vec<Milestone>> {
        let query = RecordQuery::of_type(RecordType::Milestone);
        let records = self.retried(|| self.store.query_records(zone, &query)).await?;

        let mut milestones = Vec::with_capacity(records.len());
        for record in &records {
            match wire::milestone_from_record(record, student) {
                Ok(ms) => milestones.push(ms),
                Err(e) => log::warn!("skipping malformed milestone record {}: {}", record.id, e),
            }
        }
        Ok(milestones)
    }

    /// Pulls the profile root record, if the counterpart has written one
    pub async fn pull_profile(
        &self,
        zone: &NamespaceId,
        student: &StudentId,
    ) -> SyncResult<Option<StudentProfile>> {
        let root_id = RecordId::root_for(student);
        let record = self.retried(|| self.store.fetch_record(zone, &root_id)).await?;

        match record {
            Some(record) => match wire::profile_from_record(&record, student) {
                Ok(profile) => Ok(Some(profile)),
                Err(e) => {
                    log::warn!("skipping malformed profile record {}: {}", record.id, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Pulls document metadata records, skipping malformed ones
    pub async fn pull_documents(
        &self,
        zone: &NamespaceId,
        student: &StudentId,
    ) -> SyncResult<Vec<DocumentMeta>> {
        let query = RecordQuery::of_type(RecordType::Document);
        let records = self.retried(|| self.store.query_records(zone, &query)).await?;

        let mut docs = Vec::with_capacity(records.len());
        for record in &records {
            match wire::document_from_record(record, student) {
                Ok(doc) => docs.push(doc),
                Err(e) => log::warn!("skipping malformed document record {}: {}", record.id, e),
            }
        }
        Ok(docs)
    }
}
