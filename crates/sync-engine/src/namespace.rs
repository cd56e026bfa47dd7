// crates/sync-engine/src/namespace.rs
//! Namespace and share lifecycle
//!
//! One shared namespace exists per student, owned by the instructor account.
//! Resolution of the namespace from the counterpart's perspective runs an
//! ordered list of strategies; a student who has not accepted yet resolves
//! to `None`, which is a normal pending state rather than an error.

use crate::context::SyncContext;
use crate::error::{SyncError, SyncResult};
use flightsync_core::{
    AcceptanceState, Actor, ManagedRecord, NamespaceId, RecordId, RecordType, SharedNamespace,
    StudentId,
};
use flightsync_resilience::{with_retry, RetryPolicy};
use flightsync_store::{RecordQuery, RemoteStore, StoreError, StoreResult};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;

/// Strategies for locating the namespace from the counterpart's view,
/// tried in order until one succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolveStrategy {
    /// Read the share record for the canonical zone name
    ShareMetadata,
    /// Enumerate visible zones and look for the student's root record
    EnumerateZones,
    /// Probe zone names built from owner-name variants used by older
    /// app versions
    OwnerNameVariants,
}

const RESOLUTION_ORDER: [ResolveStrategy; 3] = [
    ResolveStrategy::ShareMetadata,
    ResolveStrategy::EnumerateZones,
    ResolveStrategy::OwnerNameVariants,
];

/// Manages the per-student shared namespace lifecycle
pub struct NamespaceManager<S> {
    store: Arc<S>,
    context: Arc<SyncContext>,
    owner: String,
    retry: RetryPolicy,
}

impl<S: RemoteStore> NamespaceManager<S> {
    /// Creates a manager over a store and shared context
    pub fn new(store: Arc<S>, context: Arc<SyncContext>, owner: String, retry: RetryPolicy) -> Self {
        Self {
            store,
            context,
            owner,
            retry,
        }
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

    /// Idempotently returns the student's namespace, creating the zone,
    /// root record and share on first use. The result is cached for the
    /// process lifetime; repeated calls never re-create shares.
    pub async fn ensure_namespace(&self, student: &StudentId) -> SyncResult<SharedNamespace> {
        if let Some(cached) = self.context.cached_namespace(student) {
            if cached.is_terminated() {
                return Err(SyncError::ShareTerminated(student.to_string()));
            }
            return Ok(cached);
        }

        let mut namespace = SharedNamespace::new(student.clone(), self.owner.clone());
        let zone = namespace.id.clone();

        self.retried(|| self.store.ensure_zone(&zone)).await?;
        self.context.mark_schema_ready();

        // Root record marks the zone as belonging to this student; the
        // counterpart locates the zone by probing for it
        let root_id = RecordId::root_for(student);
        let existing = self.retried(|| self.store.fetch_record(&zone, &root_id)).await?;
        match existing {
            // Termination outlives the process through the marker record;
            // a restarted engine must not re-share the same zone
            Some(root) if root.field("terminated") == Some(&json!(true)) => {
                let mut terminated = SharedNamespace::new(student.clone(), self.owner.clone());
                terminated.advance(AcceptanceState::Terminated)?;
                self.context.cache_namespace(terminated);
                return Err(SyncError::ShareTerminated(student.to_string()));
            }
            Some(_) => {}
            None => {
                let root =
                    ManagedRecord::new(root_id, RecordType::StudentProfile, Actor::Instructor)
                        .with_field("student", json!(student.as_str()));
                self.retried(|| self.store.save_record(&zone, &root)).await?;
            }
        }

        let share = self.retried(|| self.store.create_share(&zone)).await?;

        namespace.advance(AcceptanceState::Pending)?;
        if share.is_accepted() {
            namespace.advance(AcceptanceState::Accepted)?;
        }

        log::info!(
            "namespace {} ready for student {} ({})",
            zone,
            student,
            namespace.state
        );
        self.context.cache_namespace(namespace.clone());
        Ok(namespace)
    }

    /// True only if a share record exists and has at least one participant.
    /// A generated share URL is not acceptance.
    pub async fn has_accepted_share(&self, student: &StudentId) -> SyncResult<bool> {
        // The share may live in a legacy zone; locate the zone first
        let zone = match self.context.cached_namespace(student).map(|ns| ns.id) {
            Some(zone) => zone,
            None => match self.resolve_counterpart_view(student).await? {
                Some(zone) => zone,
                None => return Ok(false),
            },
        };
        let share = self.retried(|| self.store.fetch_share(&zone)).await?;

        let accepted = share.map(|s| s.is_accepted()).unwrap_or(false);
        if accepted {
            self.context.advance_cached_state(student, AcceptanceState::Accepted);
        }
        Ok(accepted)
    }

    /// Locates the namespace as the counterpart would see it, trying each
    /// resolution strategy in order. `Ok(None)` means the student has not
    /// accepted the share yet.
    pub async fn resolve_counterpart_view(
        &self,
        student: &StudentId,
    ) -> SyncResult<Option<NamespaceId>> {
        for strategy in RESOLUTION_ORDER {
            if let Some(zone) = self.try_strategy(strategy, student).await? {
                log::debug!("resolved namespace {} via {:?}", zone, strategy);
                return Ok(Some(zone));
            }
        }
        Ok(None)
    }

    async fn try_strategy(
        &self,
        strategy: ResolveStrategy,
        student: &StudentId,
    ) -> SyncResult<Option<NamespaceId>> {
        let root_id = RecordId::root_for(student);

        match strategy {
            ResolveStrategy::ShareMetadata => {
                let zone = NamespaceId::for_student(student);
                let share = self.retried(|| self.store.fetch_share(&zone)).await?;
                Ok(share.map(|s| s.zone))
            }
            ResolveStrategy::EnumerateZones => {
                let zones = self.retried(|| self.store.list_zones()).await?;
                for zone in zones {
                    let root = self.retried(|| self.store.fetch_record(&zone, &root_id)).await?;
                    if root.is_some() {
                        return Ok(Some(zone));
                    }
                }
                Ok(None)
            }
            ResolveStrategy::OwnerNameVariants => {
                for variant in owner_variants(&self.owner) {
                    let candidate =
                        NamespaceId::from_string(format!("{}.student-{}", variant, student));
                    let root = self
                        .retried(|| self.store.fetch_record(&candidate, &root_id))
                        .await?;
                    if root.is_some() {
                        return Ok(Some(candidate));
                    }
                }
                Ok(None)
            }
        }
    }

    /// Revokes the share: deletes every record class in the namespace,
    /// writes a terminated marker root record, and deletes the share
    /// itself. One class failing to delete is logged and skipped; it never
    /// aborts the other classes.
    pub async fn terminate_share(&self, student: &StudentId) -> SyncResult<()> {
        let zone = self
            .context
            .cached_namespace(student)
            .map(|ns| ns.id)
            .unwrap_or_else(|| NamespaceId::for_student(student));

        for record_type in RecordType::deletion_order() {
            let query = RecordQuery::of_type(record_type);
            let records = match self.retried(|| self.store.query_records(&zone, &query)).await {
                Ok(records) => records,
                Err(e) => {
                    log::warn!("skipping {} cleanup in {}: {}", record_type, zone, e);
                    continue;
                }
            };

            for record in records {
                if let Err(e) = self.retried(|| self.store.delete_record(&zone, &record.id)).await {
                    log::warn!("failed to delete {} {}: {}", record_type, record.id, e);
                }
            }
        }

        let marker = ManagedRecord::new(
            RecordId::root_for(student),
            RecordType::StudentProfile,
            Actor::Instructor,
        )
        .with_field("student", json!(student.as_str()))
        .with_field("terminated", json!(true));
        if let Err(e) = self.retried(|| self.store.save_record(&zone, &marker)).await {
            log::warn!("failed to write terminated marker in {}: {}", zone, e);
        }

        self.retried(|| self.store.delete_share(&zone)).await?;

        // Cache the terminated state so re-sharing demands a new namespace
        let mut terminated = SharedNamespace::new(student.clone(), self.owner.clone());
        terminated.advance(AcceptanceState::Terminated)?;
        self.context.cache_namespace(terminated);

        log::info!("share for student {} terminated", student);
        Ok(())
    }
}

fn owner_variants(owner: &str) -> Vec<String> {
    let candidates = [
        owner.to_string(),
        owner.trim().to_string(),
        owner.to_lowercase(),
        owner.replace(' ', "_"),
    ];
    // Probe each distinct name once, in order
    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}
