// crates/resilience/src/lib.rs
//! Bounded retry for remote-store calls
//!
//! Remote calls in the sync engine are retried a small, fixed number of
//! times with a short linear backoff before the failure surfaces. Only
//! errors the caller classifies as retryable are retried.
//!
//! # Example
//!
//! ```rust
//! use flightsync_resilience::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(3).with_step(Duration::from_millis(200));
//! assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
//! ```

mod retry;

pub use retry::{with_retry, RetriesExhausted, RetryPolicy};
