//! Parser for merge-train directives in comment text.
//!
//! Directives are matched line by line: a comment body is split on newlines
//! and each line is tested, whitespace-tolerant at both ends, against the
//! two anchored patterns below. Within a body, a later matching line
//! overrides an earlier one; across comments, the caller is expected to
//! apply them in creation order so that the most recent comment wins.

use std::sync::LazyLock;

use regex::Regex;

use super::types::Directive;

/// Lines requesting a merge: `bors r+`, `bors r=<reviewer>`, `bors merge`,
/// `bors merge=<...>`.
static MERGE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*bors\s+(r\+|r=.*|merge|merge=.*)\s*$").expect("merge directive pattern")
});

/// Lines cancelling a merge: `bors r-`, `bors merge-`, `bors cancel`.
static CANCEL_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*bors\s+(r-|merge-|cancel)\s*$").expect("cancel directive pattern")
});

/// Classifies a single comment line.
///
/// The two patterns are disjoint, so the test order does not matter.
pub fn parse_directive(line: &str) -> Option<Directive> {
    if CANCEL_DIRECTIVE.is_match(line) {
        Some(Directive::Cancel)
    } else if MERGE_DIRECTIVE.is_match(line) {
        Some(Directive::Merge)
    } else {
        None
    }
}

/// Returns the effective directive of a whole comment body, if any: the last
/// matching line wins.
pub fn last_directive(body: &str) -> Option<Directive> {
    body.lines().filter_map(parse_directive).last()
}
