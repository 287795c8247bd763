//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler
//! - Wire up middleware (body rewriting, timeout, tracing)
//! - Bind server to listener
//! - Stop on the shutdown signal

use std::sync::Arc;
use std::time::Duration;

use axum::http::uri::Authority;
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::layer::RewriteBodyLayer;
use crate::http::proxy::{proxy_handler, ProxyState};
use crate::http::rewriter::BodyRewriter;
use crate::rewrite::RewriteError;

/// Error raised while building the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error("invalid upstream address {0:?}")]
    Upstream(String),
}

/// Reverse proxy for one upstream with body rewriting.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Build the server. Fails if a rewrite pattern or the upstream address
    /// is invalid.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let upstream: Authority = config
            .upstream
            .address
            .parse()
            .map_err(|_| ServerError::Upstream(config.upstream.address.clone()))?;
        let rewriter = Arc::new(BodyRewriter::new(&config.rewrite)?);

        tracing::info!(
            rules = rewriter.chain().len(),
            preserve_last_modified = rewriter.preserves_last_modified(),
            upstream = %upstream,
            "Rewrite middleware configured"
        );

        let router = Self::build_router(&config, ProxyState::new(upstream), rewriter);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: ProxyState, rewriter: Arc<BodyRewriter>) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(RewriteBodyLayer::new(rewriter))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.upstream.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewriteSpec;

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut config = GatewayConfig::default();
        config.rewrite.rewrites.push(RewriteSpec::new("*", "bar"));
        assert!(matches!(
            GatewayServer::new(config),
            Err(ServerError::Rewrite(RewriteError::InvalidPattern { .. }))
        ));
    }

    #[test]
    fn test_invalid_upstream_rejected() {
        let mut config = GatewayConfig::default();
        config.upstream.address = "not an authority".into();
        assert!(matches!(GatewayServer::new(config), Err(ServerError::Upstream(_))));
    }
}
