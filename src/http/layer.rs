//! Tower adapter for the rewrite pipeline.
//!
//! # Responsibilities
//! - Forward the request unmodified to the inner service
//! - Collect the response body and replay it through [`BodyRewriter::serve`]
//! - Let protocol upgrades (101) through without buffering
//!
//! # Design Decisions
//! - Same interceptor and pipeline as [`RewriteMiddleware`](super::RewriteMiddleware),
//!   so both surfaces share header semantics
//! - An unreadable upstream body becomes 502, there is nothing to fail open to

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::response::Parts;
use axum::http::{Request, Response, StatusCode};
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body as HttpBody;
use tower::{BoxError, Layer, Service};

use crate::http::rewriter::BodyRewriter;
use crate::http::sink::ResponseRecorder;

/// Layer that rewrites response bodies of the wrapped service.
///
/// ```rust,ignore
/// let rewriter = Arc::new(BodyRewriter::new(&config.rewrite)?);
/// let app = Router::new()
///     .route("/", any(handler))
///     .layer(RewriteBodyLayer::new(rewriter));
/// ```
#[derive(Debug, Clone)]
pub struct RewriteBodyLayer {
    rewriter: Arc<BodyRewriter>,
}

impl RewriteBodyLayer {
    pub fn new(rewriter: Arc<BodyRewriter>) -> Self {
        Self { rewriter }
    }
}

impl<S> Layer<S> for RewriteBodyLayer {
    type Service = RewriteBody<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RewriteBody {
            inner,
            rewriter: self.rewriter.clone(),
        }
    }
}

/// Service produced by [`RewriteBodyLayer`].
#[derive(Debug, Clone)]
pub struct RewriteBody<S> {
    inner: S,
    rewriter: Arc<BodyRewriter>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RewriteBody<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // The clone may not be ready; keep the one that was polled.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let rewriter = self.rewriter.clone();

        Box::pin(async move {
            let response = inner.call(request).await?;

            if response.status() == StatusCode::SWITCHING_PROTOCOLS {
                return Ok(response.map(Body::new));
            }

            let (parts, body) = response.into_parts();
            let bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    let e: BoxError = e.into();
                    tracing::warn!(parent: rewriter.span(), error = %e, "failed to read upstream body");
                    return Ok(bad_gateway());
                }
            };

            Ok(rewrite_response(&rewriter, parts, bytes))
        })
    }
}

/// Replay a fully read response through the rewriter.
fn rewrite_response(rewriter: &BodyRewriter, parts: Parts, body: Bytes) -> Response<Body> {
    let mut recorder = ResponseRecorder::new();
    let status = parts.status;
    let headers = parts.headers;

    rewriter.serve(&mut recorder, move |sink| {
        *sink.headers() = headers;
        sink.write_header(status);
        sink.write(&body).ok();
    });

    let mut response = recorder.into_response();
    *response.version_mut() = parts.version;
    *response.extensions_mut() = parts.extensions;
    response
}

fn bad_gateway() -> Response<Body> {
    let mut response = Response::new(Body::from("Upstream body could not be read"));
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response
}
