//! Fast-forward selection.
//!
//! Of all the viable futures in the pipeline tree, pick the deepest one and
//! walk back towards the base until a candidate whose checks passed is
//! found. Several heuristics would be sound here; preferring the longest
//! pipeline path advances the base as far as a single fast-forward can.

use crate::types::{BranchKey, CommitId};

use super::{PipelineTree, State};

/// Selects a commit to fast-forward the base branch to, if any.
///
/// The deepest non-tombstoned entry wins; ties go to the smaller pull
/// request number. From that tip the predecessor chain is walked until a
/// branch with passing checks is reached; reaching the base sentinel means
/// nothing can advance yet.
///
/// Pure: identical inputs yield identical results.
pub fn find_fast_forward(state: &State, tree: &PipelineTree) -> Option<CommitId> {
    let mut best: Option<(BranchKey, u32)> = None;
    for (key, value) in tree.viable() {
        let replace = match best {
            None => true,
            Some((best_key, best_weight)) => {
                value.weight > best_weight
                    || (value.weight == best_weight && key.pull_request < best_key.pull_request)
            }
        };
        if replace {
            best = Some((*key, value.weight));
        }
    }

    let mut cursor = best?.0;
    loop {
        let branch = state.branches.get(&cursor)?;
        if branch.check.passed() {
            return Some(branch.head.clone());
        }
        cursor = tree.get(&cursor)?.predecessor?;
    }
}
