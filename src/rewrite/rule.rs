//! A single compiled rewrite rule.

use std::borrow::Cow;

use regex::bytes::Regex;

use crate::config::RewriteSpec;
use crate::rewrite::RewriteError;

/// One compiled pattern and the bytes that replace its matches.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: Vec<u8>,
}

impl RewriteRule {
    /// Compile a rule. `index` is only used to identify the rule in errors.
    pub fn new(index: usize, pattern: &str, replacement: impl Into<Vec<u8>>) -> Result<Self, RewriteError> {
        let pattern = Regex::new(pattern).map_err(|source| RewriteError::InvalidPattern {
            index,
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern,
            replacement: replacement.into(),
        })
    }

    pub fn from_spec(index: usize, spec: &RewriteSpec) -> Result<Self, RewriteError> {
        Self::new(index, &spec.regex, spec.replacement.as_bytes())
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &[u8] {
        &self.replacement
    }

    /// Replace every non-overlapping match, left to right.
    ///
    /// `$1` and `${name}` in the replacement expand to capture groups.
    /// Borrows the input untouched when nothing matches.
    pub fn apply<'a>(&self, input: &'a [u8]) -> Cow<'a, [u8]> {
        self.pattern.replace_all(input, self.replacement.as_slice())
    }
}
