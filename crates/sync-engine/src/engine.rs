// crates/sync-engine/src/engine.rs
//! The sync engine facade
//!
//! Composes the namespace manager, record synchronizer and offline queue
//! behind one API the app layer drives: share with a student, sync a
//! student's snapshot, drain the queue, terminate a share. A connectivity
//! failure during a push lands the mutation in the durable queue instead of
//! surfacing as an error; everything else propagates classified.

use crate::context::{SyncConfig, SyncContext, SyncState};
use crate::error::{SyncError, SyncResult};
use crate::namespace::NamespaceManager;
use crate::notify::{NoopNotifier, Notifier, SyncEvent};
use crate::queue::{DrainReport, OfflineQueue, QueuePhase};
use crate::synchronizer::RecordSynchronizer;
use chrono::Utc;
use flightsync_core::{
    Assignment, DocumentMeta, Milestone, NamespaceId, OperationKind, PendingOperation, RecordId,
    RecordType, SharedNamespace, StudentId, StudentProfile, TrainingGoal,
};
use flightsync_library::ReferenceLibrary;
use flightsync_queue::QueuePool;
use flightsync_store::{Asset, RemoteStore};
use std::sync::Arc;

/// The instructor app's local view of one student, handed to a sync pass
#[derive(Debug, Clone)]
pub struct StudentSnapshot {
    /// The student this snapshot belongs to
    pub student: StudentId,
    /// Profile record, if the instructor has filled one in
    pub profile: Option<StudentProfile>,
    /// Assignments to push
    pub assignments: Vec<Assignment>,
    /// Documents to push, each with its binary if one is staged locally
    pub documents: Vec<(DocumentMeta, Option<Asset>)>,
}

impl StudentSnapshot {
    /// An empty snapshot for a student; useful for pull-only passes
    pub fn empty(student: StudentId) -> Self {
        Self {
            student,
            profile: None,
            assignments: Vec::new(),
            documents: Vec::new(),
        }
    }
}

/// What a sync pass produced
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    /// Student-authored goals pulled from the namespace
    pub goals: Vec<TrainingGoal>,
    /// Student-recorded milestones pulled from the namespace
    pub milestones: Vec<Milestone>,
    /// The merged profile as stored remotely, if one exists
    pub profile: Option<StudentProfile>,
    /// Document metadata visible in the namespace
    pub documents: Vec<DocumentMeta>,
    /// Mutations deferred to the offline queue during this pass
    pub queued: usize,
}

/// The instructor-side synchronization engine
pub struct SyncEngine<S> {
    config: SyncConfig,
    context: Arc<SyncContext>,
    namespaces: NamespaceManager<S>,
    synchronizer: RecordSynchronizer<S>,
    queue: OfflineQueue,
    notifier: Arc<dyn Notifier>,
    library: &'static ReferenceLibrary,
}

impl<S: RemoteStore> SyncEngine<S> {
    /// Creates an engine over a remote store and a migrated queue pool,
    /// using the catalog bundled with the app
    pub fn new(store: Arc<S>, pool: QueuePool, config: SyncConfig) -> SyncResult<Self> {
        let library = ReferenceLibrary::bundled()?;
        Ok(Self::with_library(store, pool, config, library))
    }

    /// Creates an engine with an explicit reference catalog
    pub fn with_library(
        store: Arc<S>,
        pool: QueuePool,
        config: SyncConfig,
        library: &'static ReferenceLibrary,
    ) -> Self {
        let context = Arc::new(SyncContext::new());
        let namespaces = NamespaceManager::new(
            store.clone(),
            context.clone(),
            config.owner.clone(),
            config.retry.clone(),
        );
        let synchronizer = RecordSynchronizer::new(store, config.retry.clone());
        let queue = OfflineQueue::new(pool, config.queue_max_attempts);

        Self {
            config,
            context,
            namespaces,
            synchronizer,
            queue,
            notifier: Arc::new(NoopNotifier),
            library,
        }
    }

    /// Replaces the notifier used for counterpart pings
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Creates (or returns) the student's shared namespace and share record
    pub async fn share_with_student(&self, student: &StudentId) -> SyncResult<SharedNamespace> {
        let namespace = self.namespaces.ensure_namespace(student).await?;
        self.notifier
            .notify(SyncEvent::ShareCreated, student, namespace.id.as_str());
        Ok(namespace)
    }

    /// True once the student accepted the share
    pub async fn has_accepted_share(&self, student: &StudentId) -> SyncResult<bool> {
        self.namespaces.has_accepted_share(student).await
    }

    /// Locates the namespace as the student's app would see it
    pub async fn resolve_counterpart_view(
        &self,
        student: &StudentId,
    ) -> SyncResult<Option<NamespaceId>> {
        self.namespaces.resolve_counterpart_view(student).await
    }

    /// Revokes the student's share and deletes the shared records
    pub async fn terminate_share(&self, student: &StudentId) -> SyncResult<()> {
        self.namespaces.terminate_share(student).await?;
        self.notifier
            .notify(SyncEvent::ShareTerminated, student, "share revoked");
        Ok(())
    }

    /// Runs one sync pass for a student: pushes the snapshot's records and
    /// pulls the student-authored ones. A connectivity failure on any push
    /// queues the mutation instead of failing the pass; `queued` in the
    /// outcome says how many were deferred. Only one pass per student runs
    /// at a time.
    pub async fn sync_student(&self, snapshot: &StudentSnapshot) -> SyncResult<SyncOutcome> {
        if !self.context.begin_pass(&snapshot.student) {
            return Err(SyncError::SyncInProgress(snapshot.student.to_string()));
        }
        let result = self.sync_pass(snapshot).await;
        self.context.end_pass(&snapshot.student);
        result
    }

    async fn sync_pass(&self, snapshot: &StudentSnapshot) -> SyncResult<SyncOutcome> {
        let student = &snapshot.student;
        let namespace = self.namespaces.ensure_namespace(student).await?;
        let zone = namespace.id.clone();

        let mut outcome = SyncOutcome::default();

        if let Some(profile) = &snapshot.profile {
            match self
                .synchronizer
                .push_profile(&zone, profile, self.config.actor)
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_connectivity() => {
                    self.queue
                        .enqueue(
                            OperationKind::Save,
                            student.clone(),
                            RecordId::root_for(student),
                            RecordType::StudentProfile,
                            serde_json::to_value(profile).map_err(flightsync_core::CoreError::from)?,
                        )
                        .await?;
                    outcome.queued += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let mut pushed_assignments = 0;
        for assignment in &snapshot.assignments {
            match self
                .synchronizer
                .push_assignment(&zone, assignment, self.library, self.config.actor)
                .await
            {
                Ok(()) => pushed_assignments += 1,
                Err(e) if e.is_connectivity() => {
                    self.queue
                        .enqueue(
                            OperationKind::Save,
                            student.clone(),
                            assignment.id.clone(),
                            RecordType::Assignment,
                            serde_json::to_value(assignment)
                                .map_err(flightsync_core::CoreError::from)?,
                        )
                        .await?;
                    outcome.queued += 1;
                }
                Err(e) => return Err(e),
            }
        }
        if pushed_assignments > 0 {
            self.notifier
                .notify(SyncEvent::AssignmentPushed, student, zone.as_str());
        }

        for (doc, asset) in &snapshot.documents {
            match self
                .synchronizer
                .push_document(&zone, doc, asset.as_ref(), self.config.actor)
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_connectivity() => {
                    // The binary stays staged locally; replay pushes the
                    // metadata and the next online pass carries the asset
                    self.queue
                        .enqueue(
                            OperationKind::Save,
                            student.clone(),
                            doc.id.clone(),
                            RecordType::Document,
                            serde_json::to_value(doc).map_err(flightsync_core::CoreError::from)?,
                        )
                        .await?;
                    outcome.queued += 1;
                }
                Err(e) => return Err(e),
            }
        }

        self.pull_into(&zone, student, &mut outcome).await?;

        if outcome.queued == 0 {
            self.queue.set_last_sync(Utc::now()).await?;
        }
        Ok(outcome)
    }

    /// Pull student-owned records. Losing connectivity mid-pass leaves the
    /// pull side empty rather than failing a pass that already queued its
    /// pushes.
    async fn pull_into(
        &self,
        zone: &NamespaceId,
        student: &StudentId,
        outcome: &mut SyncOutcome,
    ) -> SyncResult<()> {
        match self.synchronizer.pull_goals(zone, student).await {
            Ok(goals) => outcome.goals = goals,
            Err(e) if e.is_connectivity() => {
                log::info!("skipping pull for {}: {}", student, e);
                return Ok(());
            }
            Err(e) => return Err(e),
        }
        outcome.milestones = self.synchronizer.pull_milestones(zone, student).await?;
        outcome.profile = self.synchronizer.pull_profile(zone, student).await?;
        outcome.documents = self.synchronizer.pull_documents(zone, student).await?;
        Ok(())
    }

    /// Deletes an assignment from the student's namespace, queueing the
    /// delete if connectivity is down
    pub async fn delete_assignment(
        &self,
        student: &StudentId,
        assignment: &RecordId,
    ) -> SyncResult<()> {
        let namespace = self.namespaces.ensure_namespace(student).await?;
        match self
            .synchronizer
            .delete_assignment(&namespace.id, assignment)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_connectivity() => {
                self.queue
                    .enqueue(
                        OperationKind::Delete,
                        student.clone(),
                        assignment.clone(),
                        RecordType::Assignment,
                        serde_json::Value::Null,
                    )
                    .await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Replays queued operations oldest first. A connectivity failure stops
    /// the pass (the network is still down); any other failure burns one of
    /// that operation's attempts and moves on. Returns what happened.
    pub async fn drain_queue(&self) -> SyncResult<DrainReport> {
        if !self.queue.begin_drain() {
            log::debug!("drain already in progress, skipping");
            return Ok(DrainReport::default());
        }

        let result = self.drain_pass().await;
        let remaining = self
            .queue
            .pending()
            .await
            .map(|pending| pending.len())
            .unwrap_or(0);
        self.queue.end_drain(remaining);

        let report = result?;
        if report.replayed > 0 && remaining == 0 {
            self.queue.set_last_sync(Utc::now()).await?;
        }
        Ok(report)
    }

    async fn drain_pass(&self) -> SyncResult<DrainReport> {
        let mut report = DrainReport::default();

        for op in self.queue.pending().await? {
            match self.replay(&op).await {
                Ok(()) => {
                    self.queue.mark_replayed(&op).await?;
                    report.replayed += 1;
                }
                Err(e) if e.is_connectivity() => {
                    log::info!("still offline, stopping drain at {}", op.record_id);
                    self.queue.record_failure(&op).await?;
                    report.failed += 1;
                    break;
                }
                Err(e) => {
                    log::warn!("replay of {} failed: {}", op.record_id, e);
                    self.queue.record_failure(&op).await?;
                    report.failed += 1;
                    if op.attempts + 1 >= op.max_attempts {
                        report.exhausted += 1;
                        log::error!(
                            "operation {} for {} exhausted its {} attempts",
                            op.id,
                            op.record_id,
                            op.max_attempts
                        );
                    }
                }
            }
        }
        Ok(report)
    }

    async fn replay(&self, op: &PendingOperation) -> SyncResult<()> {
        let namespace = self.namespaces.ensure_namespace(&op.student).await?;
        let zone = &namespace.id;

        match (op.kind, op.record_type) {
            (OperationKind::Save, RecordType::Assignment) => {
                let assignment: Assignment = serde_json::from_value(op.payload.clone())
                    .map_err(flightsync_core::CoreError::from)?;
                self.synchronizer
                    .push_assignment(zone, &assignment, self.library, self.config.actor)
                    .await
            }
            (OperationKind::Save, RecordType::StudentProfile) => {
                let profile: StudentProfile = serde_json::from_value(op.payload.clone())
                    .map_err(flightsync_core::CoreError::from)?;
                self.synchronizer
                    .push_profile(zone, &profile, self.config.actor)
                    .await
            }
            (OperationKind::Save, RecordType::Document) => {
                let doc: DocumentMeta = serde_json::from_value(op.payload.clone())
                    .map_err(flightsync_core::CoreError::from)?;
                self.synchronizer
                    .push_document(zone, &doc, None, self.config.actor)
                    .await
            }
            (OperationKind::Delete, RecordType::Assignment) => {
                self.synchronizer.delete_assignment(zone, &op.record_id).await
            }
            (kind, record_type) => {
                log::warn!(
                    "no replay path for {} on {}, dropping operation {}",
                    kind.as_str(),
                    record_type,
                    op.id
                );
                Ok(())
            }
        }
    }

    /// Snapshot of the engine's durable sync state
    pub async fn state(&self) -> SyncResult<SyncState> {
        Ok(SyncState {
            last_sync: self.queue.last_sync().await?,
            pending_operations: self.queue.pending().await?.len(),
            exhausted_operations: self.queue.exhausted().await?.len(),
        })
    }

    /// Current offline queue phase
    pub fn queue_phase(&self) -> QueuePhase {
        self.queue.phase()
    }
}
