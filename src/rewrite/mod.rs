//! Pattern-based body rewriting.
//!
//! # Data Flow
//! ```text
//! RewriteConfig.rewrites ([{regex, replacement}])
//!     → rule.rs (compile each pattern, fail on the first bad one)
//!     → chain.rs (ordered, immutable RewriteChain)
//!     → shared via Arc by every request
//! ```
//!
//! # Design Decisions
//! - Patterns operate on raw bytes (`regex::bytes`), so bodies that are not
//!   valid UTF-8 are still rewritten where they match
//! - Rules apply sequentially; a later rule sees the output of an earlier one
//! - A chain is either fully built or not built at all

pub mod chain;
pub mod rule;

pub use chain::RewriteChain;
pub use rule::RewriteRule;

/// Errors raised by the rewrite stage.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// A configured pattern is not a valid regular expression.
    #[error("error compiling regex {pattern:?} (rule #{index}): {source}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Connection hijacking was requested on a writer that cannot hijack.
    #[error("{writer} is not a hijacker")]
    NotHijacker { writer: &'static str },
}
