//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! client request
//!     → server.rs (Axum setup, middleware stack)
//!     → layer.rs (RewriteBody: await upstream, collect body)
//!     → proxy.rs (forward to upstream)
//!     ← rewriter.rs (interceptor → classify → decode/rewrite/encode)
//!     → client response with corrected headers
//! ```
//!
//! Handlers that are not tower services use [`Handler`] and
//! [`RewriteMiddleware`] directly against a [`ResponseSink`].

pub mod classify;
pub mod interceptor;
pub mod layer;
pub mod middleware;
pub mod proxy;
pub mod rewriter;
pub mod server;
pub mod sink;

pub use classify::{classify, BodyAction, Classification, EncodingClass};
pub use interceptor::{HeaderState, ResponseInterceptor};
pub use layer::{RewriteBody, RewriteBodyLayer};
pub use middleware::{handler_fn, Handler, HandlerFn, RewriteMiddleware};
pub use rewriter::{BodyRewriter, RewriteOutcome};
pub use server::{GatewayServer, ServerError};
pub use sink::{Flusher, Hijacked, HijackedIo, Hijacker, ResponseRecorder, ResponseSink};
