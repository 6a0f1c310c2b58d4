//! Pure state algebra for the merge pipeline.
//!
//! `State` is one observation of the world plus derived pull-request intent.
//! It is a value: every transition takes a `&State` and returns a fresh one,
//! so a caller holding a pre-transition state observes no mutation, and a
//! transition that fails midway leaves nothing corrupted. Nothing here
//! survives across ticks; the hosting service is the only store.
//!
//! The transitions live in submodules, one per concern:
//! [`snapshot`] loads, [`pipeline`] derives the tree, [`prune`] deletes,
//! [`fast_forward`] selects, [`decorate`] classifies comments and
//! [`schedule`] creates new speculations. [`validation`] checks the
//! structural invariants in tests and debug builds.

pub mod decorate;
pub mod fast_forward;
pub mod pipeline;
pub mod prune;
pub mod schedule;
pub mod snapshot;
pub mod validation;

// Re-export the transitions and derived structures
pub use decorate::decorate_with_pull_requests;
pub use fast_forward::find_fast_forward;
pub use pipeline::{PipelineTree, PipelineValue, build_pipeline_tree};
pub use prune::{prune_cancelled, prune_orphans};
pub use schedule::{next_mergeable_pull_request, schedule_pull_request};
pub use snapshot::load_snapshot;
pub use validation::{StateViolation, validate_state};

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{BranchKey, BranchValue, CommitId, PrNumber};

/// One observation of the hosting service, plus derived pull-request intent.
///
/// Ordered containers keep every derived decision (fast-forward tie-breaks,
/// scheduling order) deterministic for a given observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// Commit at the head of the base branch.
    pub base: CommitId,
    /// The observed merge candidate branches.
    pub branches: BTreeMap<BranchKey, BranchValue>,
    /// Pull requests requested to merge, with their head commits. Populated
    /// only by the comment classifier; mergeability here does not take check
    /// suites into account.
    pub mergeable_pull_requests: BTreeMap<PrNumber, CommitId>,
    /// Pull requests with a standing cancellation order, not superseded by a
    /// later merge request. Populated only by the comment classifier.
    pub cancelled_pull_requests: BTreeSet<PrNumber>,
}

impl State {
    /// An empty state rooted at the given base head.
    pub fn new(base: CommitId) -> Self {
        State {
            base,
            branches: BTreeMap::new(),
            mergeable_pull_requests: BTreeMap::new(),
            cancelled_pull_requests: BTreeSet::new(),
        }
    }

    /// Returns true if any candidate branch belongs to the given pull
    /// request.
    pub fn owns_candidate(&self, number: PrNumber) -> bool {
        self.branches.keys().any(|key| key.pull_request == number)
    }
}
