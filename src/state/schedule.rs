//! Speculative candidate scheduling.
//!
//! For one newly eligible pull request, candidates are created for every
//! plausible future: a baseline rooted at the current base head, plus one
//! speculation per viable pipeline entry. With n queued pull requests this
//! builds up to n(n+1)/2 concurrent candidates, a deliberately simple
//! heuristic; smarter speculation fits behind the same interface.

use std::collections::BTreeSet;

use crate::host::{GithubHost, MergeOutcome};
use crate::types::{BranchKey, PrNumber};

use super::{PipelineTree, State};

/// Picks the pull request to schedule next: the smallest mergeable number
/// owning no candidate branch and not in the exclusion set.
///
/// Pure: identical inputs yield identical results.
pub fn next_mergeable_pull_request(
    state: &State,
    excluded: &BTreeSet<PrNumber>,
) -> Option<PrNumber> {
    state
        .mergeable_pull_requests
        .keys()
        .find(|number| !excluded.contains(number) && !state.owns_candidate(**number))
        .copied()
}

/// Creates candidate branches for one pull request and merges its head into
/// each: counter 1 is the baseline rooted at the base head, counters 2, 3,
/// ... root at the viable pipeline entries. Returns how many candidates were
/// created.
///
/// A merge conflict is tolerated: the candidate stays behind unextended and
/// a later cycle prunes it as an orphan.
pub async fn schedule_pull_request<H: GithubHost>(
    state: &State,
    tree: &PipelineTree,
    number: PrNumber,
    host: &H,
) -> Result<u32, H::Error> {
    let Some(head) = state.mergeable_pull_requests.get(&number) else {
        return Ok(0);
    };

    let mut key = BranchKey::new(number, 1);
    host.create_branch(&key, &state.base).await?;
    if host.merge_branch(&key, head).await? == MergeOutcome::Conflict {
        tracing::warn!(branch = %key, "merge conflict while building candidate");
    }
    let mut created = 1;

    for (tip, _) in tree.viable() {
        let Some(at) = state.branches.get(tip) else {
            continue;
        };
        key.pipeline_counter += 1;
        host.create_branch(&key, &at.head).await?;
        if host.merge_branch(&key, head).await? == MergeOutcome::Conflict {
            tracing::warn!(branch = %key, "merge conflict while building candidate");
        }
        created += 1;
    }

    Ok(created)
}
