// crates/sync-engine/src/context.rs
//! Engine configuration and shared sync state
//!
//! All process-wide state the engine needs (the namespace cache, the
//! schema-initialization flag and the set of in-flight students) lives in an
//! explicit [`SyncContext`] passed to the components. Locks guard only
//! check-and-set sections and are never held across an await.

use chrono::{DateTime, Utc};
use flightsync_core::{AcceptanceState, Actor, SharedNamespace, StudentId};
use flightsync_resilience::RetryPolicy;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Configuration for the sync engine
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Owning account name used in namespace naming and share records
    pub owner: String,
    /// Which side of the share this engine writes as
    pub actor: Actor,
    /// Retry policy for individual remote calls
    pub retry: RetryPolicy,
    /// Attempt cap for queued offline operations
    pub queue_max_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            owner: "instructor".to_string(),
            actor: Actor::Instructor,
            retry: RetryPolicy::new(3).with_step(Duration::from_millis(300)),
            queue_max_attempts: flightsync_core::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Snapshot of the engine's sync state
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    /// Last successful sync pass, if any
    pub last_sync: Option<DateTime<Utc>>,
    /// Operations awaiting replay in the offline queue
    pub pending_operations: usize,
    /// Operations that exhausted their attempt cap and need attention
    pub exhausted_operations: usize,
}

/// Shared mutable state for one engine instance
#[derive(Default)]
pub struct SyncContext {
    namespaces: Mutex<HashMap<StudentId, SharedNamespace>>,
    schema_ready: Mutex<bool>,
    in_flight: Mutex<HashSet<StudentId>>,
}

impl SyncContext {
    /// Creates an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached namespace for a student, if one was resolved this process
    pub fn cached_namespace(&self, student: &StudentId) -> Option<SharedNamespace> {
        self.namespaces
            .lock()
            .map(|cache| cache.get(student).cloned())
            .unwrap_or(None)
    }

    /// Caches a resolved namespace for the process lifetime
    pub fn cache_namespace(&self, namespace: SharedNamespace) {
        if let Ok(mut cache) = self.namespaces.lock() {
            cache.insert(namespace.student.clone(), namespace);
        }
    }

    /// Advances the cached acceptance state for a student, if cached.
    /// Backwards transitions are ignored rather than surfaced; the cache is
    /// a hint, not the source of truth.
    pub fn advance_cached_state(&self, student: &StudentId, state: AcceptanceState) {
        if let Ok(mut cache) = self.namespaces.lock() {
            if let Some(ns) = cache.get_mut(student) {
                let _ = ns.advance(state);
            }
        }
    }

    /// Returns true once the remote schema has been verified this process
    pub fn is_schema_ready(&self) -> bool {
        self.schema_ready.lock().map(|flag| *flag).unwrap_or(false)
    }

    /// Marks the remote schema verified
    pub fn mark_schema_ready(&self) {
        if let Ok(mut flag) = self.schema_ready.lock() {
            *flag = true;
        }
    }

    /// Marks a student's sync pass as started. Returns false if one is
    /// already running for that student.
    pub fn begin_pass(&self, student: &StudentId) -> bool {
        self.in_flight
            .lock()
            .map(|mut set| set.insert(student.clone()))
            .unwrap_or(false)
    }

    /// Marks a student's sync pass as finished
    pub fn end_pass(&self, student: &StudentId) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(student);
        }
    }
}
