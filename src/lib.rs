//! merge-pilot - a pipelining merge-train coordinator for GitHub.
//!
//! The coordinator advances a protected base branch using *merge candidate
//! branches*: system-owned branches named `merge-candidate-<pr>-<counter>`,
//! each holding a trial merge of a pull request on top of either the base
//! head or another candidate. When several pull requests are queued, several
//! plausible future heads are built in parallel, so the base branch can
//! fast-forward as soon as any candidate's check suite passes, without
//! invalidating the concurrent speculations built on top of it.
//!
//! The crate is split along the seam between the pure state algebra and the
//! hosting service:
//!
//! - [`types`] holds the identifier and branch-attribute types.
//! - [`state`] holds the `State` value and the transitions over it: snapshot
//!   loading, pipeline-tree derivation, pruning, fast-forward selection,
//!   comment classification and candidate scheduling.
//! - [`engine`] composes the transitions into one tick of the control loop.
//! - [`host`] is the narrow adapter contract the core consumes; [`github`]
//!   implements it with octocrab.
//! - [`commands`] parses the merge/cancel directives found in comments.
//!
//! The core is stateless between ticks: the hosting service is the only
//! state store, and every tick reconstructs the candidate commit DAG from
//! the branch tips it observes.

#[cfg(test)]
pub mod test_utils;

pub mod commands;
pub mod engine;
pub mod github;
pub mod host;
pub mod state;
pub mod types;
