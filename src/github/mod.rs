//! GitHub adapter: the octocrab-backed implementation of the host seam.
//!
//! Key features:
//! - repo-scoped client, constructed from a personal access token
//! - transient vs permanent error categorisation
//! - bounded exponential-backoff retry for transient read failures
//! - merge conflicts surfaced as values, per the host contract

mod client;
mod error;
mod retry;

pub use client::OctocrabHost;
pub use error::{HostError, HostErrorKind};
pub use retry::{RetryConfig, retry_transient};
