//! Shared utilities for integration tests.

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::routing::get;
use axum::Router;
use rewrite_body::{GatewayConfig, GatewayServer, RewriteSpec, Shutdown};
use tokio::net::TcpListener;

/// A canned upstream response.
#[derive(Clone)]
pub struct Canned {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Canned {
    pub fn text(body: &str) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![("content-type", "text/html; charset=utf-8".to_string())],
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

/// Start an upstream that answers every path with `canned`.
pub async fn start_upstream(canned: Canned) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handler = move || {
        let canned = canned.clone();
        async move {
            let mut builder = Response::builder().status(canned.status);
            for (name, value) in &canned.headers {
                builder = builder.header(*name, value.as_str());
            }
            builder.body(Body::from(canned.body)).unwrap()
        }
    };
    let app = Router::new()
        .route("/", get(handler.clone()))
        .route("/{*path}", get(handler));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// Start the gateway in front of `upstream`. Returns its address and the
/// shutdown handle keeping it alive.
pub async fn start_gateway(
    upstream: SocketAddr,
    rewrites: Vec<RewriteSpec>,
    last_modified: bool,
) -> (SocketAddr, Shutdown) {
    let mut config = GatewayConfig::default();
    config.upstream.address = upstream.to_string();
    config.rewrite.rewrites = rewrites;
    config.rewrite.last_modified = last_modified;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let server = GatewayServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
