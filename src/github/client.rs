//! octocrab-backed implementation of the host seam.
//!
//! Endpoints without a typed octocrab surface are called through its generic
//! REST routes with local wire structs, which keeps the adapter independent
//! of octocrab's model churn for the handful of fields it actually reads.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::host::{GithubHost, IssueComment, MergeOutcome};
use crate::types::{BranchKey, BranchValue, CheckStatus, CommitId, PrNumber};

use super::error::HostError;
use super::retry::{RetryConfig, retry_transient};

const PER_PAGE: u8 = 100;

/// Bounded wait while GitHub computes a pull request's mergeability.
const MERGEABILITY_POLLS: u32 = 10;
const MERGEABILITY_POLL_DELAY: Duration = Duration::from_secs(1);

// ─── Wire Types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BranchRecord {
    commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
struct BranchCommit {
    sha: String,
    parents: Vec<CommitRef>,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CheckSuitePage {
    check_suites: Vec<CheckSuiteRecord>,
}

#[derive(Debug, Deserialize)]
struct CheckSuiteRecord {
    status: String,
    conclusion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PullRecord {
    state: String,
    locked: bool,
    draft: Option<bool>,
    mergeable: Option<bool>,
    head: HeadRecord,
}

#[derive(Debug, Deserialize)]
struct HeadRecord {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommentRecord {
    body: Option<String>,
    issue_url: String,
}

#[derive(Debug, Deserialize)]
struct BranchListRecord {
    name: String,
}

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
}

#[derive(Serialize)]
struct CommentParams<'a> {
    since: &'a str,
    sort: &'a str,
    direction: &'a str,
    per_page: u8,
    page: u32,
}

#[derive(Serialize)]
struct CreateRefBody<'a> {
    r#ref: String,
    sha: &'a str,
}

#[derive(Serialize)]
struct MergeBody<'a> {
    base: &'a str,
    head: &'a str,
    commit_message: &'a str,
}

#[derive(Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// A GitHub client scoped to one repository and base branch.
pub struct OctocrabHost {
    client: octocrab::Octocrab,
    owner: String,
    repo: String,
    base_branch: String,
    retry: RetryConfig,
}

impl OctocrabHost {
    /// Builds a client authenticated with a personal access token.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        base_branch: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, octocrab::Error> {
        let client = octocrab::Octocrab::builder()
            .personal_token(token.into())
            .build()?;
        Ok(OctocrabHost {
            client,
            owner: owner.into(),
            repo: repo.into(),
            base_branch: base_branch.into(),
            retry: RetryConfig::DEFAULT,
        })
    }

    fn repo_route(&self, tail: &str) -> String {
        format!("/repos/{}/{}/{}", self.owner, self.repo, tail)
    }

    async fn fetch_branch_record(&self, name: &str) -> Result<BranchRecord, HostError> {
        self.client
            .get(self.repo_route(&format!("branches/{name}")), None::<&()>)
            .await
            .map_err(HostError::from_octocrab)
    }

    /// Fetches and folds the check suites for a commit.
    async fn check_status_for(&self, sha: &str) -> Result<CheckStatus, HostError> {
        let mut suites = Vec::new();
        let mut page = 1u32;
        loop {
            let params = PageParams {
                per_page: PER_PAGE,
                page,
            };
            let body: CheckSuitePage = self
                .client
                .get(
                    self.repo_route(&format!("commits/{sha}/check-suites")),
                    Some(&params),
                )
                .await
                .map_err(HostError::from_octocrab)?;
            let last_page = body.check_suites.len() < PER_PAGE as usize;
            suites.extend(body.check_suites);
            // One unsuccessful suite settles the outcome; later pages
            // cannot change it.
            if last_page || aggregate_check_status(&suites) == CheckStatus::Failed {
                break;
            }
            page += 1;
        }
        Ok(aggregate_check_status(&suites))
    }
}

/// Folds observed check suites into one outcome.
///
/// Any completed suite with a non-success conclusion fails the commit.
/// Otherwise the commit passes once at least one suite exists and none is
/// still running; with no suites, or any still running, it stays pending.
fn aggregate_check_status(suites: &[CheckSuiteRecord]) -> CheckStatus {
    let mut incomplete = false;
    for suite in suites {
        if suite.status != "completed" {
            incomplete = true;
        } else if suite.conclusion.as_deref() != Some("success") {
            return CheckStatus::Failed;
        }
    }
    if !suites.is_empty() && !incomplete {
        CheckStatus::Passed
    } else {
        CheckStatus::Pending
    }
}

/// One observation of a pull request, reduced to what the poll loop needs.
#[derive(Debug, Clone, PartialEq, Eq)]
enum MergeabilityDecision {
    /// Not mergeable as observed: closed, locked, a draft, or conflicted.
    NotMergeable,
    /// The service is still computing mergeability; observe again.
    Undecided,
    /// Mergeable at this head commit.
    MergeableAt(CommitId),
}

/// Classifies a pull request record for the mergeability poll loop.
fn assess_mergeability(record: &PullRecord) -> MergeabilityDecision {
    if record.state != "open" || record.locked || record.draft.unwrap_or(false) {
        return MergeabilityDecision::NotMergeable;
    }
    match record.mergeable {
        Some(true) => MergeabilityDecision::MergeableAt(CommitId::new(record.head.sha.clone())),
        Some(false) => MergeabilityDecision::NotMergeable,
        None => MergeabilityDecision::Undecided,
    }
}

impl std::fmt::Debug for OctocrabHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabHost")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("base_branch", &self.base_branch)
            .finish_non_exhaustive()
    }
}

impl GithubHost for OctocrabHost {
    type Error = HostError;

    async fn get_branch(&self, key: &BranchKey) -> Result<BranchValue, HostError> {
        let name = key.branch_name();
        let record = retry_transient(self.retry, || self.fetch_branch_record(&name)).await?;
        let is_valid = BranchKey::parse(&record.commit.commit.message) == Some(*key);
        // A tampered branch is a dead end; its checks are not worth fetching.
        let check = if is_valid {
            retry_transient(self.retry, || self.check_status_for(&record.commit.sha)).await?
        } else {
            CheckStatus::Pending
        };
        Ok(BranchValue {
            head: CommitId::new(record.commit.sha),
            parents: record
                .commit
                .parents
                .into_iter()
                .map(|p| CommitId::new(p.sha))
                .collect(),
            is_valid,
            check,
        })
    }

    async fn create_branch(&self, key: &BranchKey, at: &CommitId) -> Result<(), HostError> {
        let body = CreateRefBody {
            r#ref: format!("refs/heads/{}", key.branch_name()),
            sha: at.as_str(),
        };
        let _: serde_json::Value = self
            .client
            .post(self.repo_route("git/refs"), Some(&body))
            .await
            .map_err(HostError::from_octocrab)?;
        tracing::debug!(branch = %key, at = %at, "created candidate branch");
        Ok(())
    }

    async fn delete_branch(&self, key: &BranchKey) -> Result<(), HostError> {
        let route = self.repo_route(&format!("git/refs/heads/{}", key.branch_name()));
        let response = self
            .client
            ._delete(route, None::<&()>)
            .await
            .map_err(HostError::from_octocrab)?;
        if !response.status().is_success() {
            return Err(HostError::permanent(format!(
                "deleting {} failed with HTTP {}",
                key.branch_name(),
                response.status()
            )));
        }
        tracing::debug!(branch = %key, "deleted candidate branch");
        Ok(())
    }

    async fn merge_branch(
        &self,
        key: &BranchKey,
        head: &CommitId,
    ) -> Result<MergeOutcome, HostError> {
        let name = key.branch_name();
        let body = MergeBody {
            base: &name,
            head: head.as_str(),
            commit_message: &name,
        };
        let response = self
            .client
            ._post(self.repo_route("merges"), Some(&body))
            .await
            .map_err(HostError::from_octocrab)?;
        match response.status().as_u16() {
            // 201: merge commit created; 204: nothing to merge.
            201 | 204 => Ok(MergeOutcome::Merged),
            409 => Ok(MergeOutcome::Conflict),
            code => Err(HostError::permanent(format!(
                "merging {head} into {name} failed with HTTP {code}"
            ))),
        }
    }

    async fn base_head(&self) -> Result<CommitId, HostError> {
        let record = retry_transient(self.retry, || {
            self.fetch_branch_record(&self.base_branch)
        })
        .await?;
        Ok(CommitId::new(record.commit.sha))
    }

    async fn fast_forward_base(&self, to: &CommitId) -> Result<(), HostError> {
        let body = UpdateRefBody {
            sha: to.as_str(),
            force: false,
        };
        let route = self.repo_route(&format!("git/refs/heads/{}", self.base_branch));
        // With force off, the service rejects anything that is not a true
        // fast-forward.
        let _: serde_json::Value = self
            .client
            .patch(route, Some(&body))
            .await
            .map_err(HostError::from_octocrab)?;
        tracing::info!(base = %self.base_branch, to = %to, "fast-forwarded base branch");
        Ok(())
    }

    async fn mergeable_pull_request_head(
        &self,
        number: PrNumber,
    ) -> Result<Option<CommitId>, HostError> {
        let route = self.repo_route(&format!("pulls/{}", number.0));
        for _ in 0..MERGEABILITY_POLLS {
            let result = retry_transient(self.retry, || async {
                self.client
                    .get::<PullRecord, _, ()>(&route, None)
                    .await
                    .map_err(HostError::from_octocrab)
            })
            .await;
            let record = match result {
                Ok(record) => record,
                Err(err) if err.status_code == Some(404) => return Ok(None),
                Err(err) => return Err(err),
            };
            match assess_mergeability(&record) {
                MergeabilityDecision::MergeableAt(head) => return Ok(Some(head)),
                MergeabilityDecision::NotMergeable => return Ok(None),
                // GitHub is still computing mergeability for this pull
                // request; give it a moment.
                MergeabilityDecision::Undecided => {
                    tokio::time::sleep(MERGEABILITY_POLL_DELAY).await
                }
            }
        }
        tracing::warn!(
            pull_request = %number,
            "mergeability still unknown after polling, treating as not mergeable"
        );
        Ok(None)
    }

    async fn list_comments_since(&self, window: Duration) -> Result<Vec<IssueComment>, HostError> {
        let window = chrono::Duration::from_std(window)
            .map_err(|e| HostError::permanent(format!("comment look-back out of range: {e}")))?;
        let since = (Utc::now() - window).to_rfc3339();
        let mut comments = Vec::new();
        let mut page = 1u32;
        loop {
            let params = CommentParams {
                since: &since,
                sort: "created",
                direction: "asc",
                per_page: PER_PAGE,
                page,
            };
            let records: Vec<CommentRecord> = retry_transient(self.retry, || async {
                self.client
                    .get(self.repo_route("issues/comments"), Some(&params))
                    .await
                    .map_err(HostError::from_octocrab)
            })
            .await?;
            let last_page = records.len() < PER_PAGE as usize;
            for record in records {
                let number = record
                    .issue_url
                    .rsplit('/')
                    .next()
                    .and_then(|n| n.parse::<u64>().ok());
                match number {
                    Some(number) => comments.push(IssueComment {
                        pull_request: PrNumber(number),
                        body: record.body.unwrap_or_default(),
                    }),
                    None => {
                        tracing::warn!(
                            issue_url = %record.issue_url,
                            "skipping comment with unparseable issue URL"
                        );
                    }
                }
            }
            if last_page {
                break;
            }
            page += 1;
        }
        Ok(comments)
    }

    async fn list_merge_candidate_branches(&self) -> Result<Vec<BranchKey>, HostError> {
        let mut keys = Vec::new();
        let mut page = 1u32;
        loop {
            let params = PageParams {
                per_page: PER_PAGE,
                page,
            };
            let records: Vec<BranchListRecord> = retry_transient(self.retry, || async {
                self.client
                    .get(self.repo_route("branches"), Some(&params))
                    .await
                    .map_err(HostError::from_octocrab)
            })
            .await?;
            let last_page = records.len() < PER_PAGE as usize;
            for record in records {
                // Branches outside the candidate namespace are skipped.
                if let Some(key) = BranchKey::parse(&record.name) {
                    keys.push(key);
                }
            }
            if last_page {
                break;
            }
            page += 1;
        }
        Ok(keys)
    }
}
