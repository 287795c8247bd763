//! The response-writing surface handlers write into.
//!
//! # Responsibilities
//! - Header map access, status commit and body writes ([`ResponseSink`])
//! - Optional capabilities probed at runtime ([`Hijacker`], [`Flusher`])
//! - An in-memory sink that turns into an `http::Response` ([`ResponseRecorder`])
//!
//! # Design Decisions
//! - Capabilities are discovered with `as_hijacker` / `as_flusher` rather
//!   than through a common base type, so a sink only implements what it can do
//! - Headers are live until the status is committed

use std::fmt;
use std::io;

use axum::body::Body;
use axum::http::{HeaderMap, Response, StatusCode};
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::rewrite::RewriteError;

/// Raw bidirectional stream taken over from a sink.
pub trait HijackedIo: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> HijackedIo for T {}

/// A connection handed over to the caller, plus any bytes already read from
/// it but not yet consumed.
pub struct Hijacked {
    pub io: Box<dyn HijackedIo>,
    pub read_buf: Bytes,
}

impl fmt::Debug for Hijacked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hijacked")
            .field("read_buf", &self.read_buf.len())
            .finish_non_exhaustive()
    }
}

/// Sinks that can give up their underlying connection (protocol upgrades).
pub trait Hijacker {
    fn hijack(&mut self) -> Result<Hijacked, RewriteError>;
}

/// Sinks that can push buffered output to the client on demand.
pub trait Flusher {
    fn flush(&mut self);
}

/// Where a handler writes its response.
pub trait ResponseSink {
    /// Live header map. Changes after [`write_header`](Self::write_header)
    /// are not guaranteed to reach the client.
    fn headers(&mut self) -> &mut HeaderMap;

    /// Commit the status line and headers.
    fn write_header(&mut self, status: StatusCode);

    /// Write body bytes, committing `200 OK` first if nothing was committed.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn as_hijacker(&mut self) -> Option<&mut dyn Hijacker> {
        None
    }

    fn as_flusher(&mut self) -> Option<&mut dyn Flusher> {
        None
    }

    /// Concrete type name, used in capability errors.
    fn writer_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// In-memory [`ResponseSink`].
///
/// Snapshots the header map when the status is committed, the way a real
/// connection would have sent it. Supports flushing but not hijacking.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    headers: HeaderMap,
    committed: Option<(StatusCode, HeaderMap)>,
    body: BytesMut,
    flushed: bool,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed status, `200 OK` if none was written.
    pub fn status(&self) -> StatusCode {
        self.committed
            .as_ref()
            .map(|(status, _)| *status)
            .unwrap_or(StatusCode::OK)
    }

    /// Headers as sent with the status line, or the live map if nothing
    /// was committed yet.
    pub fn sent_headers(&self) -> &HeaderMap {
        self.committed
            .as_ref()
            .map(|(_, headers)| headers)
            .unwrap_or(&self.headers)
    }

    pub fn is_committed(&self) -> bool {
        self.committed.is_some()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn flushed(&self) -> bool {
        self.flushed
    }

    pub fn into_response(self) -> Response<Body> {
        let (status, headers) = self
            .committed
            .unwrap_or((StatusCode::OK, self.headers));

        let mut response = Response::new(Body::from(self.body.freeze()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

impl ResponseSink for ResponseRecorder {
    fn headers(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.committed.is_none() {
            self.committed = Some((status, self.headers.clone()));
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.committed.is_none() {
            self.write_header(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn as_flusher(&mut self) -> Option<&mut dyn Flusher> {
        Some(self)
    }
}

impl Flusher for ResponseRecorder {
    fn flush(&mut self) {
        if self.committed.is_none() {
            self.write_header(StatusCode::OK);
        }
        self.flushed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;
    use http_body_util::BodyExt;

    #[test]
    fn test_write_commits_ok() {
        let mut recorder = ResponseRecorder::new();
        assert!(!recorder.is_committed());
        recorder.write(b"hello").unwrap();
        assert!(recorder.is_committed());
        assert_eq!(recorder.status(), StatusCode::OK);
        assert_eq!(recorder.body(), b"hello");
    }

    #[test]
    fn test_headers_snapshot_on_commit() {
        let mut recorder = ResponseRecorder::new();
        recorder.headers().insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        recorder.write_header(StatusCode::CREATED);
        recorder.headers().insert("x-late", "1".parse().unwrap());
        recorder.write_header(StatusCode::NOT_FOUND);

        assert_eq!(recorder.status(), StatusCode::CREATED);
        assert!(recorder.sent_headers().contains_key(CONTENT_TYPE));
        assert!(!recorder.sent_headers().contains_key("x-late"));
    }

    #[test]
    fn test_capabilities() {
        let mut recorder = ResponseRecorder::new();
        assert!(recorder.as_hijacker().is_none());
        recorder.as_flusher().unwrap().flush();
        assert!(recorder.flushed());
        assert!(recorder.writer_name().ends_with("ResponseRecorder"));
    }

    #[tokio::test]
    async fn test_into_response() {
        let mut recorder = ResponseRecorder::new();
        recorder.headers().insert(CONTENT_TYPE, "text/html".parse().unwrap());
        recorder.write_header(StatusCode::ACCEPTED);
        recorder.write(b"<p>hi</p>").unwrap();

        let response = recorder.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"<p>hi</p>");
    }
}
