// crates/store/src/remote.rs
//! The remote store trait

use crate::error::StoreResult;
use crate::types::{Asset, RecordQuery, ShareInfo};
use flightsync_core::{ManagedRecord, NamespaceId, RecordId};

/// Maximum number of records per batched save
pub const MAX_BATCH_RECORDS: usize = 400;

/// Maximum size of a single binary asset, in bytes
pub const MAX_ASSET_BYTES: u64 = 15 * 1024 * 1024;

/// Typed record storage inside shared namespaces.
///
/// Implementations classify every failure into [`crate::StoreError`];
/// callers key retry and queueing decisions off that classification alone.
///
/// Writes are versioned: `save_record` rejects a record whose `change_tag`
/// does not match the stored one with a `Conflict`, and returns the stored
/// copy (with a bumped tag) on success. Deleting an absent record succeeds,
/// so replayed deletes are no-ops.
#[allow(async_fn_in_trait)]
pub trait RemoteStore: Send + Sync {
    /// Idempotently creates a namespace
    async fn ensure_zone(&self, zone: &NamespaceId) -> StoreResult<()>;

    /// Lists namespaces visible to this account
    async fn list_zones(&self) -> StoreResult<Vec<NamespaceId>>;

    /// Creates or updates one record; conflict-checked by change tag
    async fn save_record(
        &self,
        zone: &NamespaceId,
        record: &ManagedRecord,
    ) -> StoreResult<ManagedRecord>;

    /// Saves a batch of records atomically. Callers must keep batches at or
    /// under [`MAX_BATCH_RECORDS`]; the synchronizer chunks accordingly.
    async fn save_records(
        &self,
        zone: &NamespaceId,
        records: &[ManagedRecord],
    ) -> StoreResult<Vec<ManagedRecord>>;

    /// Fetches one record, `None` when absent
    async fn fetch_record(
        &self,
        zone: &NamespaceId,
        id: &RecordId,
    ) -> StoreResult<Option<ManagedRecord>>;

    /// Deletes one record; absent records delete successfully
    async fn delete_record(&self, zone: &NamespaceId, id: &RecordId) -> StoreResult<()>;

    /// Runs a predicate query scoped to a namespace
    async fn query_records(
        &self,
        zone: &NamespaceId,
        query: &RecordQuery,
    ) -> StoreResult<Vec<ManagedRecord>>;

    /// Creates the share record for a namespace, or returns the existing one
    async fn create_share(&self, zone: &NamespaceId) -> StoreResult<ShareInfo>;

    /// Fetches share metadata, `None` when the namespace has no share
    async fn fetch_share(&self, zone: &NamespaceId) -> StoreResult<Option<ShareInfo>>;

    /// Records a participant's acceptance of a share
    async fn accept_share(&self, zone: &NamespaceId, participant: &str) -> StoreResult<ShareInfo>;

    /// Deletes the share record for a namespace
    async fn delete_share(&self, zone: &NamespaceId) -> StoreResult<()>;

    /// Attaches a binary asset to a record
    async fn attach_asset(
        &self,
        zone: &NamespaceId,
        record_id: &RecordId,
        asset: &Asset,
    ) -> StoreResult<()>;

    /// Fetches a binary asset from a record, `None` when absent
    async fn fetch_asset(
        &self,
        zone: &NamespaceId,
        record_id: &RecordId,
        name: &str,
    ) -> StoreResult<Option<Asset>>;
}
