//! HTTP response-body rewriting for reverse proxies.
//!
//! Sits between an upstream handler and the client, buffers the response,
//! undoes gzip when present, applies an ordered list of regex substitutions,
//! re-compresses, and drops headers the rewrite invalidates.

pub mod codec;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;

pub use config::schema::{GatewayConfig, RewriteConfig, RewriteSpec};
pub use http::{BodyRewriter, GatewayServer, Handler, RewriteBodyLayer, RewriteMiddleware};
pub use lifecycle::Shutdown;
pub use rewrite::{RewriteChain, RewriteError, RewriteRule};
