//! Comment directives controlling the merge train.
//!
//! Users drive the coordinator by commenting on pull requests; this module
//! extracts the structured merge/cancel directives from comment text.

pub mod parser;
pub mod types;

pub use parser::{last_directive, parse_directive};
pub use types::Directive;
