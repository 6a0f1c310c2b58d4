//! Core domain types for the merge coordinator.
//!
//! These types encode the invariants of the candidate-branch namespace via
//! the type system: branch keys only exist with positive components, and
//! check outcomes are a three-state enum rather than a pair of booleans.

pub mod branch;
pub mod ids;

// Re-export commonly used types at the module level
pub use branch::{BranchKey, BranchValue, CheckStatus, MERGE_CANDIDATE_PREFIX};
pub use ids::{CommitId, PrNumber};
