//! Comment classification: deriving per-pull-request merge/cancel intent.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::commands::{Directive, last_directive};
use crate::host::GithubHost;
use crate::types::PrNumber;

use super::State;

/// Populates `mergeable_pull_requests` and `cancelled_pull_requests`.
///
/// Every pull request currently owning a candidate branch starts with merge
/// intent, so in-flight merges keep going without their authors repeating
/// themselves. Comments created within the look-back window then override,
/// in creation order: the latest directive for a pull request stands.
///
/// Merge intents are resolved through the host; a pull request that is not
/// currently mergeable (closed, locked, draft, conflicted) is dropped
/// rather than recorded. The two resulting sets are disjoint by
/// construction: each pull request carries exactly one final intent.
pub async fn decorate_with_pull_requests<H: GithubHost>(
    state: &State,
    host: &H,
    lookback: Duration,
) -> Result<State, H::Error> {
    let mut next = state.clone();

    let mut intent: BTreeMap<PrNumber, Directive> = next
        .branches
        .keys()
        .map(|key| (key.pull_request, Directive::Merge))
        .collect();
    for comment in host.list_comments_since(lookback).await? {
        if let Some(directive) = last_directive(&comment.body) {
            intent.insert(comment.pull_request, directive);
        }
    }

    for (number, directive) in intent {
        match directive {
            Directive::Cancel => {
                tracing::info!(pull_request = %number, "merge cancelled by comment");
                next.cancelled_pull_requests.insert(number);
            }
            Directive::Merge => {
                if let Some(head) = host.mergeable_pull_request_head(number).await? {
                    next.mergeable_pull_requests.insert(number, head);
                }
            }
        }
    }

    Ok(next)
}
