//! The hosting-service seam consumed by the coordinator core.
//!
//! The core never talks to GitHub directly: everything it needs is expressed
//! through [`GithubHost`], a narrow trait covering branch manipulation,
//! check-suite observation, pull request mergeability and comment listing.
//! The production implementation lives in [`crate::github`]; tests use a
//! scripted in-memory host.
//!
//! Every method is a potential blocking boundary (network I/O); within one
//! tick all calls are serialised. Any error is fatal to the current tick,
//! with one deliberate exception: a merge conflict is an ordinary outcome,
//! reported as [`MergeOutcome::Conflict`].

use std::future::Future;
use std::time::Duration;

use crate::types::{BranchKey, BranchValue, CommitId, PrNumber};

/// Outcome of attempting to merge a commit into a candidate branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The merge commit was created on the candidate branch.
    Merged,
    /// The hosting service reported a merge conflict. The candidate is left
    /// in place; a later cycle prunes it once it fails to extend the DAG.
    Conflict,
}

/// An issue comment, delivered in ascending order of creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueComment {
    /// Number of the issue or pull request the comment was posted on.
    pub pull_request: PrNumber,
    /// Raw comment body.
    pub body: String,
}

/// Capabilities the coordinator requires from the hosting service.
///
/// Implementations are scoped to a single `(owner, repo, base branch)`
/// triple. They may retry or impose timeouts internally; an error that
/// escapes a method aborts the tick, which re-observes the world on the
/// next wake.
pub trait GithubHost {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches detailed data on an existing candidate branch, including its
    /// aggregated check-suite outcome and whether its tip commit message
    /// round-trips to the branch's own name.
    fn get_branch(
        &self,
        key: &BranchKey,
    ) -> impl Future<Output = Result<BranchValue, Self::Error>> + Send;

    /// Creates a new candidate branch at the given commit. Fatal if a branch
    /// with that name already exists.
    fn create_branch(
        &self,
        key: &BranchKey,
        at: &CommitId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Deletes an existing candidate branch. Fatal if absent.
    fn delete_branch(
        &self,
        key: &BranchKey,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Merges the given commit into the candidate branch, with the branch
    /// name as the merge commit message.
    fn merge_branch(
        &self,
        key: &BranchKey,
        head: &CommitId,
    ) -> impl Future<Output = Result<MergeOutcome, Self::Error>> + Send;

    /// Commit at the head of the base branch.
    fn base_head(&self) -> impl Future<Output = Result<CommitId, Self::Error>> + Send;

    /// Fast-forwards the base branch to the given commit. The host refuses
    /// (fatally) anything that is not a true fast-forward.
    fn fast_forward_base(
        &self,
        to: &CommitId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Head commit of the given pull request, if it is currently mergeable:
    /// open, unlocked, not a draft and without merge conflicts. `None`
    /// otherwise. May poll internally while mergeability is being computed.
    fn mergeable_pull_request_head(
        &self,
        number: PrNumber,
    ) -> impl Future<Output = Result<Option<CommitId>, Self::Error>> + Send;

    /// All issue comments created within the look-back window, ascending by
    /// creation time. Ordering is part of this contract: implementations
    /// must sort if the service does not.
    fn list_comments_since(
        &self,
        window: Duration,
    ) -> impl Future<Output = Result<Vec<IssueComment>, Self::Error>> + Send;

    /// Keys of all branches whose names parse as candidate branches;
    /// non-conforming branches are skipped.
    fn list_merge_candidate_branches(
        &self,
    ) -> impl Future<Output = Result<Vec<BranchKey>, Self::Error>> + Send;
}
