//! Pipeline tree derivation.
//!
//! The pipeline tree materialises, for one observation, the subset of
//! candidate branches the base could conceivably fast-forward to: every
//! branch whose recorded parent chain connects back to the current base
//! head. Entries carry their distance from the base and a tombstone marking
//! branches that can no longer advance the base or host new speculation.
//!
//! The tree is derived fresh every cycle and never stored: the system keeps
//! no graph, so each tick reconstructs the DAG from the tips' recorded
//! parents alone.

use std::collections::{BTreeMap, HashMap};

use crate::types::{BranchKey, CommitId};

use super::State;

/// Position of a candidate branch within the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineValue {
    /// The predecessor candidate branch; `None` is the base branch itself.
    pub predecessor: Option<BranchKey>,
    /// Distance from the base head, in candidate branches.
    pub weight: u32,
    /// Tombstone: this branch, or an ancestor, is invalid or failed its
    /// checks. It stays in the tree for accounting but cannot host a
    /// fast-forward or a new speculation.
    pub tombstone: bool,
}

/// Candidate branches transitively reachable from the base head.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineTree {
    entries: BTreeMap<BranchKey, PipelineValue>,
}

impl PipelineTree {
    pub fn get(&self, key: &BranchKey) -> Option<&PipelineValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &BranchKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BranchKey, &PipelineValue)> {
        self.entries.iter()
    }

    /// Entries that can still host a fast-forward or a new speculation.
    pub fn viable(&self) -> impl Iterator<Item = (&BranchKey, &PipelineValue)> {
        self.entries.iter().filter(|(_, value)| !value.tombstone)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derives the pipeline tree for the given state.
///
/// Monotone fixed point: the base head starts as the only owned commit; a
/// branch is admitted once its first recorded parent (in parent order) is
/// owned, at which point its own head becomes owned too. Passes repeat until
/// one admits nothing.
///
/// Branches never admitted are orphans: their parent chain does not connect
/// to the current base head. That is the sole orphan criterion.
pub fn build_pipeline_tree(state: &State) -> PipelineTree {
    let mut entries: BTreeMap<BranchKey, PipelineValue> = BTreeMap::new();
    // Owner of each placed commit: a candidate branch, or `None` for the
    // base head itself.
    let mut owners: HashMap<&CommitId, Option<BranchKey>> = HashMap::new();
    owners.insert(&state.base, None);

    loop {
        let mut admitted = 0usize;
        for (key, value) in &state.branches {
            if entries.contains_key(key) {
                continue;
            }
            let Some(owner) = value.parents.iter().find_map(|p| owners.get(p).cloned()) else {
                continue;
            };
            let (predecessor_weight, inherited) = match &owner {
                None => (0, false),
                Some(predecessor) => {
                    let entry = &entries[predecessor];
                    (entry.weight, entry.tombstone)
                }
            };
            entries.insert(
                *key,
                PipelineValue {
                    predecessor: owner,
                    weight: predecessor_weight + 1,
                    tombstone: inherited || !value.is_valid || value.check.failed(),
                },
            );
            owners.insert(&value.head, Some(*key));
            admitted += 1;
        }
        if admitted == 0 {
            break;
        }
    }

    PipelineTree { entries }
}
