// crates/store/src/types.rs
//! Wire-level types for the store boundary

use chrono::{DateTime, Utc};
use flightsync_core::{NamespaceId, RecordId, RecordType};
use serde::{Deserialize, Serialize};

/// A predicate query scoped to one namespace
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    /// Match only this record type
    pub record_type: Option<RecordType>,
    /// Match only children of this record
    pub parent: Option<RecordId>,
}

impl RecordQuery {
    /// Matches all records of one type
    pub fn of_type(record_type: RecordType) -> Self {
        Self {
            record_type: Some(record_type),
            parent: None,
        }
    }

    /// Restricts the query to children of a record
    pub fn with_parent(mut self, parent: RecordId) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Share metadata for a namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareInfo {
    /// The shared namespace
    pub zone: NamespaceId,
    /// Share URL handed to the student out of band
    pub url: Option<String>,
    /// Accounts that accepted the share. A share with zero participants has
    /// not been accepted, whatever its URL says.
    pub participants: Vec<String>,
    /// When the share record was created
    pub created_at: DateTime<Utc>,
}

impl ShareInfo {
    /// Creates share metadata with no participants yet
    pub fn new(zone: NamespaceId) -> Self {
        Self {
            url: Some(format!("https://share.flightsync.example/{}", zone)),
            zone,
            participants: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Returns true once at least one participant accepted
    pub fn is_accepted(&self) -> bool {
        !self.participants.is_empty()
    }
}

/// A binary asset attached to a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Asset field name on the record
    pub name: String,
    /// Raw bytes
    pub data: Vec<u8>,
}

impl Asset {
    /// Creates an asset
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Size of the asset in bytes
    pub fn byte_size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightsync_core::StudentId;

    #[test]
    fn test_query_builder() {
        let parent = RecordId::from_string("assignment-1");
        let query = RecordQuery::of_type(RecordType::ItemProgress).with_parent(parent.clone());
        assert_eq!(query.record_type, Some(RecordType::ItemProgress));
        assert_eq!(query.parent, Some(parent));
    }

    #[test]
    fn test_share_not_accepted_without_participants() {
        let zone = NamespaceId::for_student(&StudentId::from_string("s-1"));
        let mut share = ShareInfo::new(zone);
        assert!(share.url.is_some());
        assert!(!share.is_accepted());

        share.participants.push("student@example.com".to_string());
        assert!(share.is_accepted());
    }

    #[test]
    fn test_asset_size() {
        let asset = Asset::new("scan", vec![0u8; 128]);
        assert_eq!(asset.byte_size(), 128);
    }
}
