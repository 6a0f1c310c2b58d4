//! The control loop: one tick of the coordinator.
//!
//! A tick runs the state algebra to its fixed point:
//!
//! 1. snapshot, derive the pipeline tree, prune orphans, and fast-forward
//!    the base, re-observing after every advance until nothing moves;
//! 2. classify recent comments into merge/cancel intent and prune the
//!    candidates of cancelled pull requests;
//! 3. schedule candidates for the next newly eligible pull request;
//! 4. repeat until nothing is left to schedule.
//!
//! The tick is single-shot: a caller invokes one per wake (timer or inbound
//! event) and at most one runs at a time per repository. Nothing is carried
//! across ticks; the hosting service is re-observed from scratch.


use std::collections::BTreeSet;
use std::time::Duration;

use crate::host::GithubHost;
use crate::state::{self, State};
use crate::types::PrNumber;

/// What one tick did, for operator logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// How many times the base branch was fast-forwarded.
    pub fast_forwards: u32,
    /// Pull requests for which candidates were created, in scheduling order.
    pub scheduled: Vec<PrNumber>,
}

/// Runs one tick to its fixed point.
///
/// Within the tick, a pull request gets at most one scheduling attempt: once
/// scheduled, or once observed with a failed candidate check, it is left
/// alone until a future tick re-observes it. Without this, a candidate that
/// conflicts or fails is pruned as an orphan and the same pull request would
/// be re-scheduled endlessly in the same invocation.
pub async fn run_tick<H: GithubHost>(host: &H, lookback: Duration) -> Result<TickSummary, H::Error> {
    let mut summary = TickSummary::default();
    let mut attempted: BTreeSet<PrNumber> = BTreeSet::new();

    loop {
        let mut state = advance_base(host, &mut attempted, &mut summary).await?;

        state = state::decorate_with_pull_requests(&state, host, lookback).await?;
        debug_assert_eq!(state::validate_state(&state), Ok(()));
        state = state::prune_cancelled(&state, host).await?;

        let Some(number) = state::next_mergeable_pull_request(&state, &attempted) else {
            break;
        };
        attempted.insert(number);
        let tree = state::build_pipeline_tree(&state);
        let created = state::schedule_pull_request(&state, &tree, number, host).await?;
        tracing::info!(pull_request = %number, candidates = created, "scheduled pull request");
        summary.scheduled.push(number);
    }

    tracing::debug!(
        fast_forwards = summary.fast_forwards,
        scheduled = summary.scheduled.len(),
        "tick reached its fixed point"
    );
    Ok(summary)
}

/// Snapshot, prune and fast-forward until the base stops moving.
///
/// Each successful fast-forward invalidates the observation it was based
/// on, so the world is re-snapshotted before the next attempt. Pull
/// requests whose candidates are seen failing are recorded so the
/// scheduler leaves them alone for the rest of the tick.
async fn advance_base<H: GithubHost>(
    host: &H,
    attempted: &mut BTreeSet<PrNumber>,
    summary: &mut TickSummary,
) -> Result<State, H::Error> {
    loop {
        let state = state::load_snapshot(host).await?;
        for (key, value) in &state.branches {
            if value.check.failed() {
                attempted.insert(key.pull_request);
            }
        }
        let tree = state::build_pipeline_tree(&state);
        let state = state::prune_orphans(&state, &tree, host).await?;
        debug_assert_eq!(state::validate_state(&state), Ok(()));
        match state::find_fast_forward(&state, &tree) {
            Some(target) => {
                tracing::info!(target = %target, "fast-forwarding base");
                host.fast_forward_base(&target).await?;
                summary.fast_forwards += 1;
            }
            None => return Ok(state),
        }
    }
}
