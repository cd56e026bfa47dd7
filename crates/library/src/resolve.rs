// crates/library/src/resolve.rs
//! Identifier resolution against the reference library
//!
//! Translation is one-directional: the owning app's identifiers are
//! translated into the identifiers the counterpart will find in its own
//! copy of the catalog.

use crate::catalog::ReferenceLibrary;

/// Resolves an owning app's identifiers into library identifiers
#[derive(Debug, Clone, Copy)]
pub struct IdentifierResolver<'a> {
    library: &'a ReferenceLibrary,
}

impl<'a> IdentifierResolver<'a> {
    /// Creates a resolver over a loaded library
    pub fn new(library: &'a ReferenceLibrary) -> Self {
        Self { library }
    }

    /// Resolves a checklist template's stable identifier to its library
    /// identifier, case-insensitively
    pub fn resolve_template_id(&self, stable_id: &str) -> Option<&'a str> {
        self.library
            .checklist_by_stable_id(stable_id)
            .map(|c| c.id.as_str())
    }

    /// Resolves a checklist item by stable identifier and ordinal position.
    ///
    /// Whether the checklist counts from zero or one is inferred from the
    /// minimum ordinal: if the smallest ordinal is 1 the checklist is
    /// one-based and the owner's ordinal is shifted down by one to index the
    /// sorted items. A checklist whose true first item was deleted (minimum
    /// ordinal 2 or higher) is misclassified as zero-based and resolves one
    /// item off; see `test_deleted_first_item_shifts_resolution`.
    pub fn resolve_item_id(&self, stable_id: &str, ordinal: u32) -> Option<&'a str> {
        let checklist = self.library.checklist_by_stable_id(stable_id)?;
        let items = checklist.items_by_ordinal();

        let min_ordinal = items.first().map(|item| item.ordinal)?;
        let index = if min_ordinal == 1 {
            ordinal.checked_sub(1)? as usize
        } else {
            ordinal as usize
        };

        items.get(index).map(|item| item.id.as_str())
    }

    /// Resolves a template identifier, falling back to the owner's own
    /// identifier when the library has no counterpart.
    ///
    /// Degraded mode by design: instructor-authored checklists may not exist
    /// in the catalog, and the counterpart then displays the record under
    /// the owner's identifier.
    pub fn template_id_or_fallback(&self, stable_id: &str, owner_id: &'a str) -> &'a str {
        match self.resolve_template_id(stable_id) {
            Some(id) => id,
            None => {
                log::debug!(
                    "no library counterpart for template '{}', sending owner identifier",
                    stable_id
                );
                owner_id
            }
        }
    }

    /// Resolves an item identifier with the same fallback behavior
    pub fn item_id_or_fallback(
        &self,
        stable_id: &str,
        ordinal: u32,
        owner_id: &'a str,
    ) -> &'a str {
        match self.resolve_item_id(stable_id, ordinal) {
            Some(id) => id,
            None => {
                log::debug!(
                    "no library counterpart for item {} of '{}', sending owner identifier",
                    ordinal,
                    stable_id
                );
                owner_id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(json: &str) -> ReferenceLibrary {
        ReferenceLibrary::from_json(json).unwrap()
    }

    const ONE_BASED: &str = r#"{"checklists":[{"id":"c1","stable_id":"X-1","title":"t","items":[
        {"id":"i1","title":"a","ordinal":1},
        {"id":"i2","title":"b","ordinal":2},
        {"id":"i3","title":"c","ordinal":3}
    ]}]}"#;

    const ZERO_BASED: &str = r#"{"checklists":[{"id":"c1","stable_id":"X-1","title":"t","items":[
        {"id":"i0","title":"a","ordinal":0},
        {"id":"i1","title":"b","ordinal":1},
        {"id":"i2","title":"c","ordinal":2}
    ]}]}"#;

    #[test]
    fn test_template_resolution() {
        let lib = library(ONE_BASED);
        let resolver = IdentifierResolver::new(&lib);
        assert_eq!(resolver.resolve_template_id("x-1"), Some("c1"));
        assert_eq!(resolver.resolve_template_id("Y-9"), None);
    }

    #[test]
    fn test_one_based_ordinal_one_is_first_item() {
        let lib = library(ONE_BASED);
        let resolver = IdentifierResolver::new(&lib);
        assert_eq!(resolver.resolve_item_id("X-1", 1), Some("i1"));
        assert_eq!(resolver.resolve_item_id("X-1", 3), Some("i3"));
    }

    #[test]
    fn test_zero_based_ordinal_zero_is_first_item() {
        let lib = library(ZERO_BASED);
        let resolver = IdentifierResolver::new(&lib);
        assert_eq!(resolver.resolve_item_id("X-1", 0), Some("i0"));
        assert_eq!(resolver.resolve_item_id("X-1", 2), Some("i2"));
    }

    #[test]
    fn test_out_of_range_ordinal() {
        let lib = library(ONE_BASED);
        let resolver = IdentifierResolver::new(&lib);
        assert_eq!(resolver.resolve_item_id("X-1", 4), None);
        // Ordinal 0 on a one-based checklist underflows the index
        assert_eq!(resolver.resolve_item_id("X-1", 0), None);
    }

    #[test]
    fn test_deleted_first_item_shifts_resolution() {
        // The numbering heuristic looks only at the minimum ordinal. A
        // one-based checklist whose first item was deleted starts at 2, so
        // it is classified zero-based: ordinal 2 now indexes past the end
        // and ordinal 0 lands on the first surviving item. Both apps share
        // this behavior, which keeps them consistent with each other even
        // though the mapping is shifted.
        let json = r#"{"checklists":[{"id":"c1","stable_id":"X-1","title":"t","items":[
            {"id":"i2","title":"b","ordinal":2},
            {"id":"i3","title":"c","ordinal":3}
        ]}]}"#;
        let lib = library(json);
        let resolver = IdentifierResolver::new(&lib);
        assert_eq!(resolver.resolve_item_id("X-1", 0), Some("i2"));
        assert_eq!(resolver.resolve_item_id("X-1", 1), Some("i3"));
        assert_eq!(resolver.resolve_item_id("X-1", 2), None);
    }

    #[test]
    fn test_fallback_to_owner_identifier() {
        let lib = library(ONE_BASED);
        let resolver = IdentifierResolver::new(&lib);
        assert_eq!(
            resolver.template_id_or_fallback("CUSTOM-1", "local-42"),
            "local-42"
        );
        assert_eq!(resolver.template_id_or_fallback("X-1", "local-42"), "c1");
        assert_eq!(
            resolver.item_id_or_fallback("X-1", 9, "local-item-7"),
            "local-item-7"
        );
    }

    #[test]
    fn test_bundled_zero_based_checklist() {
        let library = ReferenceLibrary::bundled().unwrap();
        let resolver = IdentifierResolver::new(library);
        // IFR-S1-L2 ships with a zero-based instrument checklist
        assert_eq!(resolver.resolve_item_id("IFR-S1-L2", 0), Some("lib-ifr-s1-l2-i0"));
        assert_eq!(resolver.resolve_item_id("PPL-S1-L1", 1), Some("lib-ppl-s1-l1-i1"));
    }
}
