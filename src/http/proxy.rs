//! Upstream forwarding.
//!
//! # Responsibilities
//! - Point the inbound request at the configured upstream
//! - Forward it with the shared hyper client
//! - Map connection failures to 502 Bad Gateway
//!
//! # Design Decisions
//! - Always speaks HTTP/1.1 to the upstream regardless of the client's version
//! - Accept-Encoding is forwarded as-is, so gzip bodies reach the rewriter

use axum::body::Body;
use axum::extract::State;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, StatusCode, Uri, Version};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

/// State injected into [`proxy_handler`].
#[derive(Clone)]
pub struct ProxyState {
    pub upstream: Authority,
    pub client: Client<HttpConnector, Body>,
}

impl ProxyState {
    pub fn new(upstream: Authority) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { upstream, client }
    }
}

/// Rebuild `uri` so it targets `upstream` over plain HTTP.
pub fn upstream_uri(uri: &Uri, upstream: &Authority) -> Result<Uri, axum::http::Error> {
    let mut parts = uri.clone().into_parts();
    parts.scheme = Some(Scheme::HTTP);
    parts.authority = Some(upstream.clone());
    if parts.path_and_query.is_none() {
        parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    Ok(Uri::from_parts(parts)?)
}

/// Catch-all handler forwarding every request to the upstream.
pub async fn proxy_handler(State(state): State<ProxyState>, request: Request<Body>) -> Response {
    let (mut parts, body) = request.into_parts();
    let method = parts.method.clone();

    parts.uri = match upstream_uri(&parts.uri, &state.upstream) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(error = %e, uri = %parts.uri, "Cannot build upstream URI");
            return (StatusCode::BAD_REQUEST, "Invalid request URI").into_response();
        }
    };
    parts.version = Version::HTTP_11;

    tracing::debug!(method = %method, uri = %parts.uri, "Proxying request");

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => response.map(Body::new),
        Err(e) => {
            tracing::error!(upstream = %state.upstream, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
