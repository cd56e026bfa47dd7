// crates/store/src/lib.rs
//! Remote object store boundary
//!
//! The sync engine never talks to a vendor SDK directly. This crate defines
//! the narrow trait the engine pushes and pulls through, the closed error
//! taxonomy every implementation must classify its failures into, and an
//! in-process store used by the engine's tests.

mod error;
mod memory;
mod remote;
mod types;

pub use error::{AuthReason, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use remote::{RemoteStore, MAX_ASSET_BYTES, MAX_BATCH_RECORDS};
pub use types::{Asset, RecordQuery, ShareInfo};
