//! Snapshot loading: one sweep of the hosting service into a `State`.

use std::collections::BTreeMap;

use crate::host::GithubHost;

use super::State;

/// Reads the base head and every candidate branch from the host.
///
/// The pull-request maps start empty; the comment classifier populates them
/// later in the cycle. A host error aborts the tick.
pub async fn load_snapshot<H: GithubHost>(host: &H) -> Result<State, H::Error> {
    let base = host.base_head().await?;
    let mut branches = BTreeMap::new();
    for key in host.list_merge_candidate_branches().await? {
        let value = host.get_branch(&key).await?;
        branches.insert(key, value);
    }
    tracing::debug!(base = %base, candidates = branches.len(), "loaded snapshot");
    Ok(State {
        base,
        branches,
        mergeable_pull_requests: BTreeMap::new(),
        cancelled_pull_requests: Default::default(),
    })
}
