// crates/library/src/catalog.rs
//! The statically shipped reference catalog

use crate::error::{LibraryError, LibraryResult};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::OnceLock;

/// One item of a library checklist
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryItem {
    /// Library identifier of the item
    pub id: String,
    /// Item title
    pub title: String,
    /// Ordinal position within the checklist
    pub ordinal: u32,
}

/// A checklist template in the reference library
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryChecklist {
    /// Library identifier of the checklist
    pub id: String,
    /// Stable human-readable identifier, constant across both apps
    pub stable_id: String,
    /// Checklist title
    pub title: String,
    /// Items in catalog order
    pub items: Vec<LibraryItem>,
}

impl LibraryChecklist {
    /// Items sorted by ordinal
    pub fn items_by_ordinal(&self) -> Vec<&LibraryItem> {
        let mut items: Vec<&LibraryItem> = self.items.iter().collect();
        items.sort_by_key(|item| item.ordinal);
        items
    }
}

/// The read-only catalog of checklist templates shipped with both apps
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceLibrary {
    checklists: Vec<LibraryChecklist>,
}

static BUNDLED: OnceLock<ReferenceLibrary> = OnceLock::new();

impl ReferenceLibrary {
    /// Loads the catalog bundled with the app. Parsed once and cached for
    /// the process lifetime.
    pub fn bundled() -> LibraryResult<&'static ReferenceLibrary> {
        if let Some(library) = BUNDLED.get() {
            return Ok(library);
        }
        let library = Self::from_json(include_str!("../assets/catalog.json"))?;
        Ok(BUNDLED.get_or_init(|| library))
    }

    /// Parses a catalog from JSON and validates it
    pub fn from_json(json: &str) -> LibraryResult<Self> {
        let library: ReferenceLibrary = serde_json::from_str(json)?;

        if library.checklists.is_empty() {
            return Err(LibraryError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for checklist in &library.checklists {
            let key = checklist.stable_id.to_ascii_lowercase();
            if !seen.insert(key) {
                return Err(LibraryError::DuplicateStableId(checklist.stable_id.clone()));
            }
        }

        log::debug!("loaded reference catalog with {} checklists", library.checklists.len());
        Ok(library)
    }

    /// Finds a checklist by stable identifier, case-insensitively
    pub fn checklist_by_stable_id(&self, stable_id: &str) -> Option<&LibraryChecklist> {
        self.checklists
            .iter()
            .find(|c| c.stable_id.eq_ignore_ascii_case(stable_id))
    }

    /// Number of checklists in the catalog
    pub fn len(&self) -> usize {
        self.checklists.len()
    }

    /// Returns true if the catalog has no checklists
    pub fn is_empty(&self) -> bool {
        self.checklists.is_empty()
    }
}
