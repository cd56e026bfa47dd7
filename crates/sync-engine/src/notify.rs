// crates/sync-engine/src/notify.rs
//! Push notification seam
//!
//! Delivery is someone else's problem; the engine fires events and moves on.
//! A notification failure never affects sync correctness, so the trait has
//! no error channel.

use flightsync_core::StudentId;

/// Events worth telling the counterpart app about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// A share was created for the student
    ShareCreated,
    /// An assignment (with its items) was pushed
    AssignmentPushed,
    /// The share was revoked
    ShareTerminated,
}

/// Fire-and-forget notification delivery
pub trait Notifier: Send + Sync {
    /// Notifies the recipient about an event; best effort
    fn notify(&self, event: SyncEvent, recipient: &StudentId, context: &str);
}

/// Default notifier that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, event: SyncEvent, recipient: &StudentId, context: &str) {
        log::debug!("notify {:?} -> {} ({})", event, recipient, context);
    }
}
