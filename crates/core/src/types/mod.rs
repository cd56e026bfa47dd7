// crates/core/src/types/mod.rs
//! Type definitions for the sync data model

pub mod common;
pub mod entity;
pub mod namespace;
pub mod operation;
pub mod record;
