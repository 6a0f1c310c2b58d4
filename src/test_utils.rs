//! Scripted in-memory host for exercising the coordinator end to end.
//!
//! The fixture models just enough of a hosting service: a symbolic commit
//! graph (`main`, pull request heads `pr-N`, merge commits `merge(A, B)`),
//! check suites that complete after a configured number of observations,
//! injectable merge conflicts, and a trace of every state-changing call.
//!
//! Fixture misuse (deleting an absent branch, merging into nothing) panics,
//! pointing at a bug in either the test or the control loop.

use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use std::sync::Mutex;
use std::time::Duration;

use crate::host::{GithubHost, IssueComment, MergeOutcome};
use crate::types::{BranchKey, BranchValue, CheckStatus, CommitId, PrNumber};

/// Symbolic merge commit id: `merge(A, B)`.
pub fn merge_commit(a: &CommitId, b: &CommitId) -> CommitId {
    CommitId::new(format!("merge({a}, {b})"))
}

/// Symbolic pull request head commit id: `pr-N`.
pub fn pr_commit(number: PrNumber) -> CommitId {
    CommitId::new(format!("pr-{}", number.0))
}

#[derive(Debug)]
struct FixturePullRequest {
    head: CommitId,
    mergeable: bool,
}

#[derive(Debug)]
struct Fixture {
    base_head: CommitId,
    branches: BTreeMap<BranchKey, BranchValue>,
    /// Known commits and their parents.
    commits: BTreeMap<CommitId, Vec<CommitId>>,
    pull_requests: BTreeMap<PrNumber, FixturePullRequest>,
    comments: Vec<IssueComment>,
    /// Branch/pull-request pairs whose trial merge conflicts.
    conflicts: BTreeSet<(BranchKey, PrNumber)>,
    /// Commits whose check suite completes after this many more
    /// observations; the bool is the eventual outcome.
    check_schedule: BTreeMap<CommitId, (u32, bool)>,
    /// Commits whose check suite has completed, with outcome.
    completed_checks: BTreeMap<CommitId, bool>,
    trace: Vec<String>,
}

impl Fixture {
    fn new() -> Self {
        let base = CommitId::new("main");
        let mut commits = BTreeMap::new();
        commits.insert(base.clone(), vec![CommitId::new("epoch")]);
        Fixture {
            base_head: base,
            branches: BTreeMap::new(),
            commits,
            pull_requests: BTreeMap::new(),
            comments: Vec::new(),
            conflicts: BTreeSet::new(),
            check_schedule: BTreeMap::new(),
            completed_checks: BTreeMap::new(),
            trace: Vec::new(),
        }
    }

    /// Resolves one observation of the check suite for a commit. Returns the
    /// final outcome once it is known.
    fn observe_check(&mut self, commit: &CommitId) -> Option<bool> {
        if let Some(&pass) = self.completed_checks.get(commit) {
            return Some(pass);
        }
        let (polls_left, pass) = self.check_schedule.get_mut(commit)?;
        if *polls_left == 0 {
            let pass = *pass;
            self.check_schedule.remove(commit);
            self.completed_checks.insert(commit.clone(), pass);
            Some(pass)
        } else {
            *polls_left -= 1;
            None
        }
    }

    fn pull_request_owning(&self, head: &CommitId) -> PrNumber {
        let (number, pr) = self
            .pull_requests
            .iter()
            .find(|(_, pr)| pr.head == *head)
            .unwrap_or_else(|| panic!("commit {head} is not a pull request head"));
        assert!(pr.mergeable, "pull request {number} is not mergeable");
        *number
    }

    fn record(&mut self, line: String) {
        self.trace.push(line);
    }
}

/// Deterministic in-memory [`GithubHost`] with scripted check outcomes.
pub struct ScriptedHost {
    fixture: Mutex<Fixture>,
}

impl ScriptedHost {
    /// A host whose base branch sits at the symbolic commit `main`.
    pub fn new() -> Self {
        ScriptedHost {
            fixture: Mutex::new(Fixture::new()),
        }
    }

    fn fixture_mut(&mut self) -> &mut Fixture {
        self.fixture.get_mut().expect("fixture lock poisoned")
    }

    /// Registers a pull request with head `pr-<number>`.
    pub fn with_pull_request(mut self, number: u64, mergeable: bool) -> Self {
        let number = PrNumber(number);
        let head = pr_commit(number);
        let fixture = self.fixture_mut();
        fixture
            .commits
            .insert(head.clone(), vec![CommitId::new("epoch")]);
        fixture
            .pull_requests
            .insert(number, FixturePullRequest { head, mergeable });
        self
    }

    /// Appends an issue comment; insertion order is creation order.
    pub fn with_comment(mut self, number: u64, body: &str) -> Self {
        self.fixture_mut().comments.push(IssueComment {
            pull_request: PrNumber(number),
            body: body.to_string(),
        });
        self
    }

    /// Declares that merging the given pull request's head into the given
    /// candidate branch will report a conflict.
    pub fn with_merge_conflict(mut self, key: BranchKey, number: u64) -> Self {
        self.fixture_mut().conflicts.insert((key, PrNumber(number)));
        self
    }

    /// Schedules the check suite for a commit to complete after `polls` more
    /// observations, successfully.
    pub fn passing_after(mut self, commit: &CommitId, polls: u32) -> Self {
        self.fixture_mut()
            .check_schedule
            .insert(commit.clone(), (polls, true));
        self
    }

    /// Schedules the check suite for a commit to complete after `polls` more
    /// observations, unsuccessfully.
    pub fn failing_after(mut self, commit: &CommitId, polls: u32) -> Self {
        self.fixture_mut()
            .check_schedule
            .insert(commit.clone(), (polls, false));
        self
    }

    /// Seeds a pre-existing candidate branch: a merge of the pull request
    /// head into `parent`, with the given check outcome already observed
    /// when it is not `Pending`.
    pub fn with_candidate(mut self, key: BranchKey, parent: &CommitId, check: CheckStatus) -> Self {
        let head = self.seed_candidate_commits(key, parent);
        let fixture = self.fixture_mut();
        if check.is_done() {
            fixture
                .completed_checks
                .insert(head.clone(), check.passed());
        }
        let parents = fixture.commits[&head].clone();
        fixture.branches.insert(
            key,
            BranchValue {
                head,
                parents,
                is_valid: true,
                check,
            },
        );
        self
    }

    /// Seeds a candidate branch whose tip commit no longer carries the
    /// branch's own name, as if someone pushed to it.
    pub fn with_tampered_candidate(mut self, key: BranchKey, parent: &CommitId) -> Self {
        let head = self.seed_candidate_commits(key, parent);
        let fixture = self.fixture_mut();
        let parents = fixture.commits[&head].clone();
        fixture.branches.insert(
            key,
            BranchValue {
                head,
                parents,
                is_valid: false,
                check: CheckStatus::Pending,
            },
        );
        self
    }

    /// Registers the pull request head and merge commit backing a seeded
    /// candidate, returning the candidate's head commit.
    fn seed_candidate_commits(&mut self, key: BranchKey, parent: &CommitId) -> CommitId {
        let fixture = self.fixture_mut();
        let pr_head = pr_commit(key.pull_request);
        fixture
            .commits
            .entry(pr_head.clone())
            .or_insert_with(|| vec![CommitId::new("epoch")]);
        let head = merge_commit(parent, &pr_head);
        fixture
            .commits
            .insert(head.clone(), vec![parent.clone(), pr_head]);
        head
    }

    /// The base head as currently recorded.
    pub fn base(&self) -> CommitId {
        self.fixture.lock().unwrap().base_head.clone()
    }

    /// Keys of the candidate branches currently present, in order.
    pub fn branch_keys(&self) -> Vec<BranchKey> {
        self.fixture
            .lock()
            .unwrap()
            .branches
            .keys()
            .copied()
            .collect()
    }

    /// The current value of a candidate branch; panics if absent.
    pub fn branch_value(&self, key: &BranchKey) -> BranchValue {
        self.fixture.lock().unwrap().branches[key].clone()
    }

    /// True if the pull request exists and is currently mergeable.
    pub fn is_mergeable(&self, number: u64) -> bool {
        self.fixture
            .lock()
            .unwrap()
            .pull_requests
            .get(&PrNumber(number))
            .is_some_and(|pr| pr.mergeable)
    }

    /// The trace of state-changing calls, oldest first.
    pub fn trace(&self) -> Vec<String> {
        self.fixture.lock().unwrap().trace.clone()
    }
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl GithubHost for ScriptedHost {
    type Error = Infallible;

    async fn get_branch(&self, key: &BranchKey) -> Result<BranchValue, Infallible> {
        let mut fixture = self.fixture.lock().unwrap();
        let value = fixture
            .branches
            .get(key)
            .unwrap_or_else(|| panic!("branch {key} not found"))
            .clone();
        if !value.check.is_done()
            && let Some(pass) = fixture.observe_check(&value.head)
        {
            let outcome = if pass {
                CheckStatus::Passed
            } else {
                CheckStatus::Failed
            };
            fixture.branches.get_mut(key).unwrap().check = outcome;
            fixture.record(format!(
                "checks {} for {}",
                if pass { "pass" } else { "fail" },
                key.branch_name()
            ));
        }
        Ok(fixture.branches[key].clone())
    }

    async fn create_branch(&self, key: &BranchKey, at: &CommitId) -> Result<(), Infallible> {
        let mut fixture = self.fixture.lock().unwrap();
        fixture.record(format!("create {} at {}", key.branch_name(), at));
        assert!(
            !fixture.branches.contains_key(key),
            "branch {key} already exists"
        );
        let parents = fixture
            .commits
            .get(at)
            .unwrap_or_else(|| panic!("commit {at} not found"))
            .clone();
        // A fresh branch points at an existing commit, whose message is not
        // the branch's own name.
        fixture.branches.insert(
            *key,
            BranchValue {
                head: at.clone(),
                parents,
                is_valid: false,
                check: CheckStatus::Pending,
            },
        );
        Ok(())
    }

    async fn delete_branch(&self, key: &BranchKey) -> Result<(), Infallible> {
        let mut fixture = self.fixture.lock().unwrap();
        fixture.record(format!("delete {}", key.branch_name()));
        assert!(
            fixture.branches.remove(key).is_some(),
            "branch {key} not found"
        );
        Ok(())
    }

    async fn merge_branch(
        &self,
        key: &BranchKey,
        head: &CommitId,
    ) -> Result<MergeOutcome, Infallible> {
        let mut fixture = self.fixture.lock().unwrap();
        fixture.record(format!("merge {} into {}", head, key.branch_name()));
        let number = fixture.pull_request_owning(head);
        assert_eq!(
            number, key.pull_request,
            "merged commit belongs to another pull request"
        );
        if fixture.conflicts.contains(&(*key, number)) {
            return Ok(MergeOutcome::Conflict);
        }
        let branch = fixture
            .branches
            .get(key)
            .unwrap_or_else(|| panic!("branch {key} not found"))
            .clone();
        let merged = merge_commit(&branch.head, head);
        fixture
            .commits
            .insert(merged.clone(), vec![branch.head.clone(), head.clone()]);
        fixture.branches.insert(
            *key,
            BranchValue {
                head: merged,
                parents: vec![branch.head, head.clone()],
                is_valid: true,
                check: CheckStatus::Pending,
            },
        );
        Ok(MergeOutcome::Merged)
    }

    async fn base_head(&self) -> Result<CommitId, Infallible> {
        Ok(self.fixture.lock().unwrap().base_head.clone())
    }

    async fn fast_forward_base(&self, to: &CommitId) -> Result<(), Infallible> {
        let mut fixture = self.fixture.lock().unwrap();
        fixture.record(format!("fast-forward to {to}"));
        // Follow first parents back to the current base, collecting the pull
        // request heads merged along the way.
        let mut merged_heads = Vec::new();
        let mut cursor = to.clone();
        while cursor != fixture.base_head {
            let parents = fixture
                .commits
                .get(&cursor)
                .unwrap_or_else(|| panic!("fast-forward target {to} is not linked to the base"))
                .clone();
            match parents.as_slice() {
                [first, second] => {
                    merged_heads.push(second.clone());
                    cursor = first.clone();
                }
                [first] => cursor = first.clone(),
                _ => panic!("fast-forward target {to} is not linked to the base"),
            }
        }
        for head in merged_heads {
            if let Some(pr) = fixture
                .pull_requests
                .values_mut()
                .find(|pr| pr.head == head)
            {
                pr.mergeable = false;
            }
        }
        fixture.base_head = to.clone();
        Ok(())
    }

    async fn mergeable_pull_request_head(
        &self,
        number: PrNumber,
    ) -> Result<Option<CommitId>, Infallible> {
        let fixture = self.fixture.lock().unwrap();
        Ok(fixture
            .pull_requests
            .get(&number)
            .filter(|pr| pr.mergeable)
            .map(|pr| pr.head.clone()))
    }

    async fn list_comments_since(
        &self,
        _window: Duration,
    ) -> Result<Vec<IssueComment>, Infallible> {
        Ok(self.fixture.lock().unwrap().comments.clone())
    }

    async fn list_merge_candidate_branches(&self) -> Result<Vec<BranchKey>, Infallible> {
        Ok(self
            .fixture
            .lock()
            .unwrap()
            .branches
            .keys()
            .copied()
            .collect())
    }
}
