//! Merge candidate branch naming and observed branch attributes.
//!
//! A candidate branch is uniquely named `merge-candidate-<pr>-<counter>`.
//! The name doubles as the commit message of the merge commit at the tip,
//! which is how a tick recognises branches it created itself: a branch whose
//! tip message does not round-trip to its own name has been tampered with
//! and is treated as a leaf that cannot be extended.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CommitId, PrNumber};

/// Prefix identifying a branch as a merge candidate owned by the coordinator.
pub const MERGE_CANDIDATE_PREFIX: &str = "merge-candidate";

/// Uniquely names a merge candidate branch.
///
/// The pipeline counter distinguishes concurrent speculations for the same
/// pull request; both components are strictly positive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BranchKey {
    pub pull_request: PrNumber,
    pub pipeline_counter: u64,
}

impl BranchKey {
    pub fn new(pull_request: PrNumber, pipeline_counter: u64) -> Self {
        BranchKey {
            pull_request,
            pipeline_counter,
        }
    }

    /// Returns the branch name on the wire: `merge-candidate-<pr>-<counter>`.
    pub fn branch_name(&self) -> String {
        format!(
            "{}-{}-{}",
            MERGE_CANDIDATE_PREFIX, self.pull_request.0, self.pipeline_counter
        )
    }

    /// Parses a branch name back into a key.
    ///
    /// Returns `None` unless the name has the exact prefix followed by
    /// exactly two non-empty decimal fields, both strictly positive. Leading
    /// zeros are accepted; signs are not.
    pub fn parse(name: &str) -> Option<BranchKey> {
        let suffix = name
            .strip_prefix(MERGE_CANDIDATE_PREFIX)?
            .strip_prefix('-')?;
        let (pr, counter) = suffix.split_once('-')?;
        Some(BranchKey {
            pull_request: PrNumber(parse_positive(pr)?),
            pipeline_counter: parse_positive(counter)?,
        })
    }
}

impl fmt::Display for BranchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.branch_name())
    }
}

/// Parses a strictly positive decimal integer composed of digits only.
fn parse_positive(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match field.parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

/// Observed check-suite outcome for a candidate branch tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// No suite has completed yet, or some suites are still running.
    Pending,
    /// Every suite completed and all concluded successfully.
    Passed,
    /// At least one suite concluded unsuccessfully.
    Failed,
}

impl CheckStatus {
    /// Returns true once the outcome can no longer change.
    pub fn is_done(&self) -> bool {
        !matches!(self, CheckStatus::Pending)
    }

    pub fn passed(&self) -> bool {
        matches!(self, CheckStatus::Passed)
    }

    pub fn failed(&self) -> bool {
        matches!(self, CheckStatus::Failed)
    }
}

/// Attributes of an observed candidate branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchValue {
    /// Commit at the tip of the branch.
    pub head: CommitId,
    /// Parents of the tip commit, in recorded order. A merge commit created
    /// by the coordinator has exactly two: the branch it was rooted at, then
    /// the pull request head.
    pub parents: Vec<CommitId>,
    /// True iff the tip commit's message parses as this branch's own name,
    /// i.e. the branch was created by the coordinator and is untampered.
    pub is_valid: bool,
    /// Check-suite outcome observed for the tip commit.
    pub check: CheckStatus,
}
