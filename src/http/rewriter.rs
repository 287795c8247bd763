//! Per-request rewrite pipeline.
//!
//! # Data Flow
//! ```text
//! downstream handler
//!     → ResponseInterceptor (headers stripped at commit, body buffered)
//!     → classify (Content-Type / Content-Encoding)
//!     → [Codec::decode] → RewriteChain → [Codec::encode]
//!     → one write to the real sink
//! ```
//!
//! # Design Decisions
//! - Fail-open: codec errors degrade to unmodified (decode) or uncompressed
//!   (encode) bytes, never to an error response
//! - Diagnostics go through the span injected at construction; the core
//!   never touches a global logger

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use tracing::Span;

use crate::codec::{Codec, Gzip};
use crate::config::RewriteConfig;
use crate::http::classify::{classify, BodyAction, EncodingClass};
use crate::http::interceptor::{HeaderState, ResponseInterceptor};
use crate::http::sink::ResponseSink;
use crate::observability::metrics;
use crate::rewrite::{RewriteChain, RewriteError};

/// What happened to one response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// Rules were applied; `compressed` if the body was decoded and re-encoded.
    Rewritten { compressed: bool },
    /// Content-Type is not text.
    NotText,
    /// Compressed with a format the codec does not handle.
    UnsupportedEncoding(String),
    /// The body could not be decoded; original bytes were sent.
    DecodeFailed,
    /// The rewritten body could not be re-encoded; it was sent uncompressed.
    EncodeFailed,
}

impl RewriteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewriteOutcome::Rewritten { .. } => "rewritten",
            RewriteOutcome::NotText => "passthrough_not_text",
            RewriteOutcome::UnsupportedEncoding(_) => "passthrough_encoding",
            RewriteOutcome::DecodeFailed => "decode_failed",
            RewriteOutcome::EncodeFailed => "encode_failed",
        }
    }
}

/// Shared, immutable core of a rewrite middleware instance.
#[derive(Debug)]
pub struct BodyRewriter {
    chain: RewriteChain,
    codec: Arc<dyn Codec>,
    preserve_last_modified: bool,
    span: Span,
}

impl BodyRewriter {
    /// Compile the configured rules. Fails on the first invalid pattern.
    pub fn new(config: &RewriteConfig) -> Result<Self, RewriteError> {
        let chain = RewriteChain::compile(&config.rewrites)?;

        Ok(Self {
            chain,
            codec: Arc::new(Gzip),
            preserve_last_modified: config.last_modified,
            span: tracing::info_span!("rewrite_body", name = %config.name),
        })
    }

    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Emit this rewriter's events under `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn chain(&self) -> &RewriteChain {
        &self.chain
    }

    pub fn preserves_last_modified(&self) -> bool {
        self.preserve_last_modified
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Run `next` against an interceptor over `w`, then rewrite what it
    /// produced and send it to `w` in a single write.
    pub fn serve<F>(&self, w: &mut dyn ResponseSink, next: F) -> RewriteOutcome
    where
        F: FnOnce(&mut dyn ResponseSink),
    {
        let mut interceptor = ResponseInterceptor::new(&mut *w, self.preserve_last_modified);
        next(&mut interceptor);
        // Header correction must also apply to handlers that wrote nothing.
        if interceptor.state() == HeaderState::Pending {
            interceptor.write_header(StatusCode::OK);
        }
        let buffered = interceptor.into_body();

        let (body, outcome) = self.process(w.headers(), buffered);
        metrics::record_outcome(&outcome);

        if let Err(e) = w.write(&body) {
            tracing::error!(
                parent: &self.span,
                error = %e,
                outcome = outcome.as_str(),
                "unable to write body"
            );
        }

        outcome
    }

    /// Classify and transform a buffered body.
    pub fn process(&self, headers: &HeaderMap, body: Bytes) -> (Bytes, RewriteOutcome) {
        let classification = classify(headers, self.codec.encoding());

        match classification.action() {
            BodyAction::PassThrough => {
                let outcome = match classification.encoding {
                    EncodingClass::Unsupported(encoding) if classification.text => {
                        RewriteOutcome::UnsupportedEncoding(encoding)
                    }
                    _ => RewriteOutcome::NotText,
                };
                tracing::debug!(
                    parent: &self.span,
                    reason = outcome.as_str(),
                    bytes = body.len(),
                    "passing body through"
                );
                (body, outcome)
            }
            BodyAction::Rewrite => (
                self.chain.apply(body),
                RewriteOutcome::Rewritten { compressed: false },
            ),
            BodyAction::DecodeRewriteEncode => self.recode(body),
        }
    }

    fn recode(&self, body: Bytes) -> (Bytes, RewriteOutcome) {
        let decoded = match self.codec.decode(&body) {
            Ok(decoded) => Bytes::from(decoded),
            Err(e) => {
                tracing::warn!(
                    parent: &self.span,
                    error = %e,
                    encoding = self.codec.encoding(),
                    "failed to decode body, sending it unmodified"
                );
                return (body, RewriteOutcome::DecodeFailed);
            }
        };

        let rewritten = self.chain.apply(decoded);

        match self.codec.encode(&rewritten) {
            Ok(encoded) => (Bytes::from(encoded), RewriteOutcome::Rewritten { compressed: true }),
            Err(e) => {
                // Content-Encoding still names the codec here.
                tracing::warn!(
                    parent: &self.span,
                    error = %e,
                    encoding = self.codec.encoding(),
                    "unable to recompress rewritten body, sending it uncompressed"
                );
                (rewritten, RewriteOutcome::EncodeFailed)
            }
        }
    }
}
