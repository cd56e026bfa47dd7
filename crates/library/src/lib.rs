// crates/library/src/lib.rs
//! Embedded reference library and identifier resolution
//!
//! Both the instructor and student apps ship an identical, read-only catalog
//! of checklist templates keyed by stable human-readable identifiers (lesson
//! codes). Each app generates its own local record identifiers, so records
//! crossing the share carry library identifiers resolved here; when a
//! checklist has no library counterpart the owner's identifier travels
//! instead.
//!
//! # Example
//!
//! ```rust
//! use flightsync_library::{IdentifierResolver, ReferenceLibrary};
//!
//! let library = ReferenceLibrary::bundled().unwrap();
//! let resolver = IdentifierResolver::new(library);
//! assert!(resolver.resolve_template_id("ppl-s1-l1").is_some());
//! ```

mod catalog;
mod error;
mod resolve;

pub use catalog::{LibraryChecklist, LibraryItem, ReferenceLibrary};
pub use error::{LibraryError, LibraryResult};
pub use resolve::IdentifierResolver;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_loads() {
        let library = ReferenceLibrary::bundled().unwrap();
        assert!(!library.is_empty());
    }
}
