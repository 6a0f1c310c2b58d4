//! Pruning of orphaned and cancelled candidate branches.
//!
//! Both transitions delete branches on the hosting service as well as from
//! the state; a deletion failure aborts the tick, and the next tick
//! re-observes whatever actually happened.

use crate::host::GithubHost;

use super::{PipelineTree, State};

/// Deletes every candidate branch not present in the pipeline tree.
///
/// Such branches no longer connect to the base head: either the base was
/// fast-forwarded past them, or their trial merge never extended the DAG.
pub async fn prune_orphans<H: GithubHost>(
    state: &State,
    tree: &PipelineTree,
    host: &H,
) -> Result<State, H::Error> {
    let mut next = state.clone();
    let orphans: Vec<_> = next
        .branches
        .keys()
        .filter(|key| !tree.contains(key))
        .copied()
        .collect();
    for key in orphans {
        tracing::info!(branch = %key, "deleting orphaned candidate branch");
        host.delete_branch(&key).await?;
        next.branches.remove(&key);
    }
    Ok(next)
}

/// Deletes every candidate branch owned by a cancelled pull request, then
/// clears the cancellation set.
pub async fn prune_cancelled<H: GithubHost>(state: &State, host: &H) -> Result<State, H::Error> {
    let mut next = state.clone();
    let cancelled: Vec<_> = next
        .branches
        .keys()
        .filter(|key| next.cancelled_pull_requests.contains(&key.pull_request))
        .copied()
        .collect();
    for key in cancelled {
        tracing::info!(branch = %key, "deleting cancelled candidate branch");
        host.delete_branch(&key).await?;
        next.branches.remove(&key);
    }
    next.cancelled_pull_requests.clear();
    Ok(next)
}
