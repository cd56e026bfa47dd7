// crates/queue/src/lib.rs
//! Durable offline operation log
//!
//! Mutations that fail while disconnected are persisted here and replayed by
//! the sync engine once connectivity returns. The log survives process
//! restarts; the last-successful-sync timestamp lives alongside it.

mod connection;
mod error;
mod migrations;
pub mod queries;

pub use connection::{close, create_pool, create_test_db, QueueConfig, QueuePool};
pub use error::{QueueError, QueueResult};
pub use migrations::{current_version, run_migrations};
