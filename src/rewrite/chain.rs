//! Ordered sequence of rewrite rules.

use std::borrow::Cow;

use bytes::Bytes;

use crate::config::RewriteSpec;
use crate::rewrite::{RewriteError, RewriteRule};

/// Rules applied left to right, each consuming the previous rule's output.
///
/// Immutable once built and safe to share between concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct RewriteChain {
    rules: Vec<RewriteRule>,
}

impl RewriteChain {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// Compile every configured rule. The first invalid pattern aborts the
    /// whole chain.
    pub fn compile(specs: &[RewriteSpec]) -> Result<Self, RewriteError> {
        let rules = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| RewriteRule::from_spec(index, spec))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Run the body through every rule in declaration order.
    pub fn apply(&self, body: Bytes) -> Bytes {
        let mut current = body;
        for rule in &self.rules {
            // Only allocate when the rule actually changed something.
            let rewritten = match rule.apply(&current) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(rewritten) => rewritten,
            };
            current = Bytes::from(rewritten);
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(regex: &str, replacement: &str) -> RewriteSpec {
        RewriteSpec {
            regex: regex.to_string(),
            replacement: replacement.to_string(),
        }
    }

    #[test]
    fn test_single_rule() {
        let chain = RewriteChain::compile(&[spec("foo", "bar")]).unwrap();
        let out = chain.apply(Bytes::from_static(b"foo is the new bar"));
        assert_eq!(out, Bytes::from_static(b"bar is the new bar"));
    }

    #[test]
    fn test_rules_compose_sequentially() {
        let chain = RewriteChain::compile(&[spec("foo", "bar"), spec("bar", "foo")]).unwrap();
        let out = chain.apply(Bytes::from_static(b"foo is the new bar"));
        assert_eq!(out, Bytes::from_static(b"foo is the new foo"));
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let chain = RewriteChain::default();
        assert!(chain.is_empty());
        let body = Bytes::from_static(b"untouched");
        assert_eq!(chain.apply(body.clone()), body);
    }

    #[test]
    fn test_compile_fails_without_partial_chain() {
        let err = RewriteChain::compile(&[spec("foo", "bar"), spec("*", "x"), spec("baz", "y")])
            .unwrap_err();
        assert!(matches!(err, RewriteError::InvalidPattern { index: 1, .. }));
    }

    #[test]
    fn test_preserves_rule_order() {
        let chain = RewriteChain::compile(&[spec("a", "b"), spec("b", "c")]).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.rules()[0].pattern(), "a");
        assert_eq!(chain.apply(Bytes::from_static(b"ab")), Bytes::from_static(b"cc"));
    }
}
