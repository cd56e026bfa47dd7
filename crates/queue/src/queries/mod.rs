// crates/queue/src/queries/mod.rs
//! Queue database queries

pub mod meta;
pub mod operations;
