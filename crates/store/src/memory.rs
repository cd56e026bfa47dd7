// crates/store/src/memory.rs
//! In-process store implementation
//!
//! Backs the engine's tests. Mirrors the semantics the engine relies on from
//! a production backend: change-tag conflict checks, tolerant deletes, share
//! participant tracking, and injectable connectivity and provisioning
//! failures.

use crate::error::{AuthReason, StoreError, StoreResult};
use crate::remote::{RemoteStore, MAX_ASSET_BYTES, MAX_BATCH_RECORDS};
use crate::types::{Asset, RecordQuery, ShareInfo};
use flightsync_core::{ManagedRecord, NamespaceId, RecordId, RecordType};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct Zone {
    records: HashMap<RecordId, ManagedRecord>,
    assets: HashMap<(RecordId, String), Asset>,
    share: Option<ShareInfo>,
}

#[derive(Default)]
struct Inner {
    zones: HashMap<NamespaceId, Zone>,
    unprovisioned: HashSet<RecordType>,
}

/// In-memory remote store with failure injection
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    offline: AtomicBool,
    write_count: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates loss or restoration of connectivity. While offline every
    /// call fails with a Connectivity classification.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Marks a record type as absent from the remote schema; saves and
    /// queries for it fail with a Provisioning classification
    pub async fn mark_unprovisioned(&self, record_type: RecordType) {
        self.inner.lock().await.unprovisioned.insert(record_type);
    }

    /// Number of mutating calls (saves and deletes) made so far
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Number of records currently stored in a zone
    pub async fn record_count(&self, zone: &NamespaceId) -> usize {
        self.inner
            .lock()
            .await
            .zones
            .get(zone)
            .map(|z| z.records.len())
            .unwrap_or(0)
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Connectivity("network unreachable".to_string()));
        }
        Ok(())
    }

    fn check_provisioned(inner: &Inner, record_type: RecordType) -> StoreResult<()> {
        if inner.unprovisioned.contains(&record_type) {
            return Err(StoreError::Provisioning {
                record_type: record_type.to_string(),
            });
        }
        Ok(())
    }

    fn store_record(zone: &mut Zone, record: &ManagedRecord) -> StoreResult<ManagedRecord> {
        let next_tag = match zone.records.get(&record.id) {
            Some(existing) => {
                if existing.change_tag != record.change_tag {
                    return Err(StoreError::Conflict {
                        record_id: record.id.to_string(),
                    });
                }
                existing.change_tag + 1
            }
            None => 1,
        };

        let mut stored = record.clone();
        stored.change_tag = next_tag;
        zone.records.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    fn matches(record: &ManagedRecord, query: &RecordQuery) -> bool {
        if let Some(ty) = query.record_type {
            if record.record_type != ty {
                return false;
            }
        }
        if let Some(parent) = &query.parent {
            if record.parent.as_ref() != Some(parent) {
                return false;
            }
        }
        true
    }
}

impl RemoteStore for MemoryStore {
    async fn ensure_zone(&self, zone: &NamespaceId) -> StoreResult<()> {
        self.check_online()?;
        self.inner.lock().await.zones.entry(zone.clone()).or_default();
        Ok(())
    }

    async fn list_zones(&self) -> StoreResult<Vec<NamespaceId>> {
        self.check_online()?;
        Ok(self.inner.lock().await.zones.keys().cloned().collect())
    }

    async fn save_record(
        &self,
        zone: &NamespaceId,
        record: &ManagedRecord,
    ) -> StoreResult<ManagedRecord> {
        self.check_online()?;
        self.write_count.fetch_add(1, Ordering::SeqCst);

        let mut inner = self.inner.lock().await;
        Self::check_provisioned(&inner, record.record_type)?;
        let zone = inner.zones.entry(zone.clone()).or_default();
        Self::store_record(zone, record)
    }

    async fn save_records(
        &self,
        zone: &NamespaceId,
        records: &[ManagedRecord],
    ) -> StoreResult<Vec<ManagedRecord>> {
        debug_assert!(records.len() <= MAX_BATCH_RECORDS);
        self.check_online()?;
        self.write_count.fetch_add(1, Ordering::SeqCst);

        let mut inner = self.inner.lock().await;
        for record in records {
            Self::check_provisioned(&inner, record.record_type)?;
        }

        let zone = inner.zones.entry(zone.clone()).or_default();

        // Atomic batch: reject the whole save if any record conflicts
        for record in records {
            if let Some(existing) = zone.records.get(&record.id) {
                if existing.change_tag != record.change_tag {
                    return Err(StoreError::Conflict {
                        record_id: record.id.to_string(),
                    });
                }
            }
        }

        let mut stored = Vec::with_capacity(records.len());
        for record in records {
            stored.push(Self::store_record(zone, record)?);
        }
        Ok(stored)
    }

    async fn fetch_record(
        &self,
        zone: &NamespaceId,
        id: &RecordId,
    ) -> StoreResult<Option<ManagedRecord>> {
        self.check_online()?;
        Ok(self
            .inner
            .lock()
            .await
            .zones
            .get(zone)
            .and_then(|z| z.records.get(id).cloned()))
    }

    async fn delete_record(&self, zone: &NamespaceId, id: &RecordId) -> StoreResult<()> {
        self.check_online()?;
        self.write_count.fetch_add(1, Ordering::SeqCst);
        if let Some(zone) = self.inner.lock().await.zones.get_mut(zone) {
            zone.records.remove(id);
        }
        Ok(())
    }

    async fn query_records(
        &self,
        zone: &NamespaceId,
        query: &RecordQuery,
    ) -> StoreResult<Vec<ManagedRecord>> {
        self.check_online()?;
        let inner = self.inner.lock().await;
        if let Some(ty) = query.record_type {
            Self::check_provisioned(&inner, ty)?;
        }
        Ok(inner
            .zones
            .get(zone)
            .map(|z| {
                z.records
                    .values()
                    .filter(|r| Self::matches(r, query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create_share(&self, zone: &NamespaceId) -> StoreResult<ShareInfo> {
        self.check_online()?;
        let mut inner = self.inner.lock().await;
        let entry = inner.zones.entry(zone.clone()).or_default();
        let share = entry.share.get_or_insert_with(|| ShareInfo::new(zone.clone()));
        Ok(share.clone())
    }

    async fn fetch_share(&self, zone: &NamespaceId) -> StoreResult<Option<ShareInfo>> {
        self.check_online()?;
        Ok(self
            .inner
            .lock()
            .await
            .zones
            .get(zone)
            .and_then(|z| z.share.clone()))
    }

    async fn accept_share(&self, zone: &NamespaceId, participant: &str) -> StoreResult<ShareInfo> {
        self.check_online()?;
        let mut inner = self.inner.lock().await;
        let share = inner
            .zones
            .get_mut(zone)
            .and_then(|z| z.share.as_mut())
            .ok_or(StoreError::Authorization {
                reason: AuthReason::PermissionDenied,
            })?;
        if !share.participants.iter().any(|p| p == participant) {
            share.participants.push(participant.to_string());
        }
        Ok(share.clone())
    }

    async fn delete_share(&self, zone: &NamespaceId) -> StoreResult<()> {
        self.check_online()?;
        if let Some(zone) = self.inner.lock().await.zones.get_mut(zone) {
            zone.share = None;
        }
        Ok(())
    }

    async fn attach_asset(
        &self,
        zone: &NamespaceId,
        record_id: &RecordId,
        asset: &Asset,
    ) -> StoreResult<()> {
        self.check_online()?;
        if asset.byte_size() > MAX_ASSET_BYTES {
            return Err(StoreError::Authorization {
                reason: AuthReason::QuotaExceeded,
            });
        }
        let mut inner = self.inner.lock().await;
        let zone = inner.zones.entry(zone.clone()).or_default();
        zone.assets
            .insert((record_id.clone(), asset.name.clone()), asset.clone());
        Ok(())
    }

    async fn fetch_asset(
        &self,
        zone: &NamespaceId,
        record_id: &RecordId,
        name: &str,
    ) -> StoreResult<Option<Asset>> {
        self.check_online()?;
        Ok(self
            .inner
            .lock()
            .await
            .zones
            .get(zone)
            .and_then(|z| z.assets.get(&(record_id.clone(), name.to_string())).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightsync_core::{Actor, StudentId};
    use serde_json::json;

    fn zone() -> NamespaceId {
        NamespaceId::for_student(&StudentId::from_string("s-1"))
    }

    fn record(id: &str) -> ManagedRecord {
        ManagedRecord::new(
            RecordId::from_string(id),
            RecordType::Assignment,
            Actor::Instructor,
        )
        .with_field("template", json!("PPL-S1-L1"))
    }

    #[tokio::test]
    async fn test_save_bumps_change_tag() {
        let store = MemoryStore::new();
        let zone = zone();
        store.ensure_zone(&zone).await.unwrap();

        let stored = store.save_record(&zone, &record("rec-1")).await.unwrap();
        assert_eq!(stored.change_tag, 1);

        let stored = store.save_record(&zone, &stored).await.unwrap();
        assert_eq!(stored.change_tag, 2);
    }

    #[tokio::test]
    async fn test_stale_change_tag_conflicts() {
        let store = MemoryStore::new();
        let zone = zone();
        store.ensure_zone(&zone).await.unwrap();

        let stale = store.save_record(&zone, &record("rec-1")).await.unwrap();
        store.save_record(&zone, &stale).await.unwrap();

        // Writing with the superseded tag must be rejected
        let err = store.save_record(&zone, &stale).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_batch_is_atomic_on_conflict() {
        let store = MemoryStore::new();
        let zone = zone();
        store.ensure_zone(&zone).await.unwrap();

        let current = store.save_record(&zone, &record("rec-1")).await.unwrap();
        store.save_record(&zone, &current).await.unwrap();

        let mut stale = current;
        stale.change_tag = 1;
        let fresh = record("rec-2");

        let err = store.save_records(&zone, &[fresh, stale]).await.unwrap_err();
        assert!(err.is_conflict());
        // rec-2 must not have been created by the failed batch
        assert!(store
            .fetch_record(&zone, &RecordId::from_string("rec-2"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_absent_record_succeeds() {
        let store = MemoryStore::new();
        let zone = zone();
        store.ensure_zone(&zone).await.unwrap();
        assert!(store
            .delete_record(&zone, &RecordId::from_string("missing"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_offline_classifies_connectivity() {
        let store = MemoryStore::new();
        let zone = zone();
        store.set_offline(true);

        let err = store.save_record(&zone, &record("rec-1")).await.unwrap_err();
        assert!(err.is_retryable());

        store.set_offline(false);
        store.ensure_zone(&zone).await.unwrap();
        assert!(store.save_record(&zone, &record("rec-1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_unprovisioned_type() {
        let store = MemoryStore::new();
        let zone = zone();
        store.ensure_zone(&zone).await.unwrap();
        store.mark_unprovisioned(RecordType::Assignment).await;

        let err = store.save_record(&zone, &record("rec-1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Provisioning { .. }));
        assert!(err.remediation().is_some());
    }

    #[tokio::test]
    async fn test_share_lifecycle() {
        let store = MemoryStore::new();
        let zone = zone();
        store.ensure_zone(&zone).await.unwrap();

        let share = store.create_share(&zone).await.unwrap();
        assert!(!share.is_accepted());

        // Creating again returns the same share
        let again = store.create_share(&zone).await.unwrap();
        assert_eq!(share.created_at, again.created_at);

        let accepted = store.accept_share(&zone, "student@example.com").await.unwrap();
        assert!(accepted.is_accepted());

        store.delete_share(&zone).await.unwrap();
        assert!(store.fetch_share(&zone).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_accept_without_share_denied() {
        let store = MemoryStore::new();
        let zone = zone();
        store.ensure_zone(&zone).await.unwrap();

        let err = store.accept_share(&zone, "student@example.com").await.unwrap_err();
        assert!(matches!(err, StoreError::Authorization { .. }));
    }

    #[tokio::test]
    async fn test_query_by_type_and_parent() {
        let store = MemoryStore::new();
        let zone = zone();
        store.ensure_zone(&zone).await.unwrap();

        let parent = record("assignment-1");
        store.save_record(&zone, &parent).await.unwrap();

        let child = ManagedRecord::new(
            RecordId::from_string("item-1"),
            RecordType::ItemProgress,
            Actor::Instructor,
        )
        .with_parent(parent.id.clone());
        store.save_record(&zone, &child).await.unwrap();

        let items = store
            .query_records(
                &zone,
                &RecordQuery::of_type(RecordType::ItemProgress).with_parent(parent.id.clone()),
            )
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, child.id);

        let assignments = store
            .query_records(&zone, &RecordQuery::of_type(RecordType::Assignment))
            .await
            .unwrap();
        assert_eq!(assignments.len(), 1);
    }

    #[tokio::test]
    async fn test_asset_size_limit() {
        let store = MemoryStore::new();
        let zone = zone();
        store.ensure_zone(&zone).await.unwrap();
        let record_id = RecordId::from_string("doc-1");

        let small = Asset::new("scan", vec![0u8; 64]);
        store.attach_asset(&zone, &record_id, &small).await.unwrap();
        let fetched = store.fetch_asset(&zone, &record_id, "scan").await.unwrap();
        assert_eq!(fetched.unwrap().byte_size(), 64);

        let huge = Asset::new("scan", vec![0u8; (MAX_ASSET_BYTES + 1) as usize]);
        let err = store.attach_asset(&zone, &record_id, &huge).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Authorization { reason: AuthReason::QuotaExceeded }
        ));
    }

    #[tokio::test]
    async fn test_write_counter() {
        let store = MemoryStore::new();
        let zone = zone();
        store.ensure_zone(&zone).await.unwrap();
        assert_eq!(store.write_count(), 0);

        store.save_record(&zone, &record("rec-1")).await.unwrap();
        store.delete_record(&zone, &RecordId::from_string("rec-1")).await.unwrap();
        assert_eq!(store.write_count(), 2);

        store.fetch_record(&zone, &RecordId::from_string("rec-1")).await.unwrap();
        assert_eq!(store.write_count(), 2);
    }
}
