//! Handler composition.
//!
//! A [`Handler`] writes one response into a [`ResponseSink`].
//! [`RewriteMiddleware`] wraps a handler and is a handler itself, so any
//! number of them can be stacked.

use std::sync::Arc;

use axum::http::Request;
use bytes::Bytes;

use crate::config::RewriteConfig;
use crate::http::rewriter::BodyRewriter;
use crate::http::sink::ResponseSink;
use crate::rewrite::RewriteError;

/// Produces a response for a request.
pub trait Handler: Send + Sync {
    fn serve_http(&self, w: &mut dyn ResponseSink, req: &Request<Bytes>);
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn serve_http(&self, w: &mut dyn ResponseSink, req: &Request<Bytes>) {
        (**self).serve_http(w, req)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn serve_http(&self, w: &mut dyn ResponseSink, req: &Request<Bytes>) {
        (**self).serve_http(w, req)
    }
}

/// Adapter returned by [`handler_fn`].
#[derive(Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

/// Turn a closure into a [`Handler`].
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut dyn ResponseSink, &Request<Bytes>) + Send + Sync,
{
    HandlerFn { f }
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&mut dyn ResponseSink, &Request<Bytes>) + Send + Sync,
{
    fn serve_http(&self, w: &mut dyn ResponseSink, req: &Request<Bytes>) {
        (self.f)(w, req)
    }
}

/// Rewrites the bodies produced by `next`.
pub struct RewriteMiddleware<H> {
    next: H,
    rewriter: Arc<BodyRewriter>,
}

impl<H: Handler> RewriteMiddleware<H> {
    /// Fails if any configured pattern does not compile; no handler is
    /// produced in that case.
    pub fn new(next: H, config: &RewriteConfig) -> Result<Self, RewriteError> {
        let rewriter = BodyRewriter::new(config)?;
        Ok(Self::from_rewriter(next, Arc::new(rewriter)))
    }

    pub fn from_rewriter(next: H, rewriter: Arc<BodyRewriter>) -> Self {
        Self { next, rewriter }
    }

    pub fn rewriter(&self) -> &Arc<BodyRewriter> {
        &self.rewriter
    }
}

impl<H: Handler> Handler for RewriteMiddleware<H> {
    fn serve_http(&self, w: &mut dyn ResponseSink, req: &Request<Bytes>) {
        self.rewriter
            .serve(w, |sink| self.next.serve_http(sink, req));
    }
}
