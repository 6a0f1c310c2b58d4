//! Structural invariant checks over `State`.
//!
//! The transitions preserve these properties by construction; this module
//! makes them checkable, for tests and for debug assertions in the control
//! loop.

use thiserror::Error;

use crate::types::{BranchKey, PrNumber};

use super::State;

/// A violated structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateViolation {
    #[error("branch name {name:?} does not round-trip to its key")]
    NameRoundTrip { name: String },

    #[error("branch {branch} has {count} recorded parents")]
    TooManyParents { branch: BranchKey, count: usize },

    #[error("valid branch {branch} has {count} recorded parents, expected 2")]
    ValidParentCount { branch: BranchKey, count: usize },

    #[error("pull request {number} is both mergeable and cancelled")]
    IntentOverlap { number: PrNumber },
}

/// Checks the structural invariants of a state.
///
/// - every branch key round-trips through its wire name;
/// - tips have at most two recorded parents, valid tips exactly two;
/// - the mergeable and cancelled sets are disjoint.
pub fn validate_state(state: &State) -> Result<(), StateViolation> {
    for (key, value) in &state.branches {
        let name = key.branch_name();
        if BranchKey::parse(&name) != Some(*key) {
            return Err(StateViolation::NameRoundTrip { name });
        }
        if value.parents.len() > 2 {
            return Err(StateViolation::TooManyParents {
                branch: *key,
                count: value.parents.len(),
            });
        }
        if value.is_valid && value.parents.len() != 2 {
            return Err(StateViolation::ValidParentCount {
                branch: *key,
                count: value.parents.len(),
            });
        }
    }
    for number in &state.cancelled_pull_requests {
        if state.mergeable_pull_requests.contains_key(number) {
            return Err(StateViolation::IntentOverlap { number: *number });
        }
    }
    Ok(())
}
