// crates/sync-engine/src/lib.rs
//! Instructor-side synchronization engine
//!
//! Keeps instructor-owned, student-owned and jointly-editable records
//! consistent between the instructor app and each student's companion app.
//! The two apps never talk to each other directly; everything flows through
//! a per-student shared namespace in the remote object store:
//! - Namespace lifecycle: share creation, acceptance detection, revocation
//! - Identifier resolution against the embedded reference library
//! - Per-record-type ownership and merge policy
//! - Durable offline queue with bounded-retry replay
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use flightsync_store::MemoryStore;
//! use flightsync_sync_engine::{SyncConfig, SyncEngine};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let pool = flightsync_queue::create_test_db().await?;
//! flightsync_queue::run_migrations(&pool).await?;
//!
//! let engine = SyncEngine::new(store, pool, SyncConfig::default())?;
//! let student = flightsync_core::StudentId::new();
//! engine.share_with_student(&student).await?;
//! # Ok(())
//! # }
//! ```

mod context;
mod engine;
mod error;
mod merge;
mod namespace;
mod notify;
mod queue;
mod synchronizer;
mod wire;

pub use context::{SyncConfig, SyncContext, SyncState};
pub use engine::{StudentSnapshot, SyncEngine, SyncOutcome};
pub use error::{SyncError, SyncResult};
pub use merge::merge_on_conflict;
pub use namespace::NamespaceManager;
pub use notify::{NoopNotifier, Notifier, SyncEvent};
pub use queue::{DrainReport, OfflineQueue, QueuePhase};
pub use synchronizer::RecordSynchronizer;
