//! GitHub API error types.
//!
//! Errors are categorised for retry decisions: **transient** failures (5xx,
//! rate limits, network trouble) are worth retrying with backoff, while
//! **permanent** failures (most 4xx, bad credentials) need a human or a
//! fresh tick. Anything that escapes the adapter aborts the current tick;
//! the next wake re-observes the world.

use std::fmt;

use thiserror::Error;

/// The kind of GitHub API error, categorised for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostErrorKind {
    /// Safe to retry with backoff: 5xx, 429, rate-limited 403, network
    /// timeouts.
    Transient,

    /// Requires intervention or a later tick: most 4xx, authentication
    /// failures, malformed requests.
    Permanent,
}

impl HostErrorKind {
    pub fn is_retriable(&self) -> bool {
        matches!(self, HostErrorKind::Transient)
    }
}

/// A GitHub API failure with categorisation for retry decisions.
#[derive(Debug, Error)]
pub struct HostError {
    pub kind: HostErrorKind,

    /// The HTTP status code, if one could be determined.
    pub status_code: Option<u16>,

    /// Human-readable description.
    pub message: String,

    /// The underlying octocrab error, if any.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            HostErrorKind::Transient => "transient",
            HostErrorKind::Permanent => "permanent",
        };
        write!(f, "{kind} GitHub failure: {}", self.message)?;
        if let Some(code) = self.status_code {
            write!(f, " [status {code}]")?;
        }
        Ok(())
    }
}

impl HostError {
    /// A permanent error with no underlying octocrab source.
    pub fn permanent(message: impl Into<String>) -> Self {
        HostError {
            kind: HostErrorKind::Permanent,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// A transient error with no underlying octocrab source.
    pub fn transient(message: impl Into<String>) -> Self {
        HostError {
            kind: HostErrorKind::Transient,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Categorises an octocrab error by status code and message shape.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status_code = extract_status_code(&err);
        let message = err.to_string();
        let kind = match status_code {
            Some(429) => HostErrorKind::Transient,
            Some(403) if is_rate_limit_message(&message) => HostErrorKind::Transient,
            Some(code) if (500..600).contains(&code) => HostErrorKind::Transient,
            Some(_) => HostErrorKind::Permanent,
            None if is_network_message(&message) => HostErrorKind::Transient,
            None => HostErrorKind::Permanent,
        };
        HostError {
            kind,
            status_code,
            message,
            source: Some(err),
        }
    }
}

/// Extracts the HTTP status code from an octocrab error.
///
/// The structured variant carries one directly; other variants fall back to
/// message inspection. A missing code only makes categorisation more
/// conservative.
fn extract_status_code(err: &octocrab::Error) -> Option<u16> {
    if let octocrab::Error::GitHub { source, .. } = err {
        return Some(source.status_code.as_u16());
    }
    let text = err.to_string();
    for code in [404u16, 409, 422, 401, 403, 429, 500, 502, 503] {
        if text.contains(&code.to_string()) {
            return Some(code);
        }
    }
    None
}

fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("rate limit") || lower.contains("abuse detection")
}

fn is_network_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection")
        || lower.contains("dns")
}
