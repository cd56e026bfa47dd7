// crates/core/src/types/namespace.rs
//! Shared namespace lifecycle

use crate::error::{CoreError, CoreResult};
use crate::types::common::{NamespaceId, StudentId};
use serde::{Deserialize, Serialize};

/// Acceptance state of a shared namespace.
///
/// Advances monotonically forward; `Terminated` is terminal and re-sharing
/// requires a brand-new namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AcceptanceState {
    /// No share has been requested yet
    Unshared,
    /// A share exists but the student has not accepted it
    Pending,
    /// The student accepted; records are visible to both accounts
    Accepted,
    /// The share was revoked; terminal
    Terminated,
}

impl AcceptanceState {
    /// Returns true if `next` is a legal transition from this state
    pub fn can_transition_to(self, next: AcceptanceState) -> bool {
        if self == AcceptanceState::Terminated {
            return false;
        }
        // Forward-only, except termination is reachable from anywhere
        next == AcceptanceState::Terminated || next > self
    }
}

impl std::fmt::Display for AcceptanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AcceptanceState::Unshared => "unshared",
            AcceptanceState::Pending => "pending",
            AcceptanceState::Accepted => "accepted",
            AcceptanceState::Terminated => "terminated",
        };
        write!(f, "{}", s)
    }
}

/// The per-student shared namespace, owned by the instructor account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedNamespace {
    /// Namespace (zone) identifier in the remote store
    pub id: NamespaceId,
    /// The student this namespace is shared with
    pub student: StudentId,
    /// Owning account reference (the instructor's account name)
    pub owner: String,
    /// Current acceptance state
    pub state: AcceptanceState,
}

impl SharedNamespace {
    /// Creates a namespace for a student in the unshared state
    pub fn new(student: StudentId, owner: String) -> Self {
        Self {
            id: NamespaceId::for_student(&student),
            student,
            owner,
            state: AcceptanceState::Unshared,
        }
    }

    /// Advances the acceptance state, rejecting backwards moves and any
    /// transition out of `Terminated`
    pub fn advance(&mut self, next: AcceptanceState) -> CoreResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }

    /// Returns true if records in this namespace are visible to the student
    pub fn is_accepted(&self) -> bool {
        self.state == AcceptanceState::Accepted
    }

    /// Returns true if this namespace can never be shared again
    pub fn is_terminated(&self) -> bool {
        self.state == AcceptanceState::Terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespace() -> SharedNamespace {
        SharedNamespace::new(StudentId::from_string("s-1"), "cfi".to_string())
    }

    #[test]
    fn test_forward_transitions() {
        let mut ns = namespace();
        assert!(ns.advance(AcceptanceState::Pending).is_ok());
        assert!(ns.advance(AcceptanceState::Accepted).is_ok());
        assert!(ns.is_accepted());
    }

    #[test]
    fn test_backwards_transition_rejected() {
        let mut ns = namespace();
        ns.advance(AcceptanceState::Accepted).unwrap();
        assert!(ns.advance(AcceptanceState::Pending).is_err());
        assert_eq!(ns.state, AcceptanceState::Accepted);
    }

    #[test]
    fn test_termination_reachable_from_any_state() {
        let mut ns = namespace();
        assert!(ns.advance(AcceptanceState::Terminated).is_ok());

        let mut ns = namespace();
        ns.advance(AcceptanceState::Accepted).unwrap();
        assert!(ns.advance(AcceptanceState::Terminated).is_ok());
    }

    #[test]
    fn test_terminated_is_terminal() {
        let mut ns = namespace();
        ns.advance(AcceptanceState::Terminated).unwrap();
        assert!(ns.advance(AcceptanceState::Pending).is_err());
        assert!(ns.advance(AcceptanceState::Accepted).is_err());
        assert!(ns.advance(AcceptanceState::Terminated).is_err());
        assert!(ns.is_terminated());
    }

    #[test]
    fn test_namespace_id_derived_from_student() {
        let ns = namespace();
        assert_eq!(ns.id.as_str(), "student-s-1");
    }
}
