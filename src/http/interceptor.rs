//! Buffering response interceptor.
//!
//! # Responsibilities
//! - Look like a normal sink to the downstream handler
//! - Keep the body in memory instead of sending it
//! - Drop Content-Length (and Last-Modified unless preserved) at commit
//! - Forward hijack/flush to the real sink when it supports them
//!
//! # State
//! ```text
//! Pending ──write_header / first write / flush──▶ Committed ──into_body──▶ (done)
//! ```

use std::io;

use axum::http::header::{CONTENT_LENGTH, LAST_MODIFIED};
use axum::http::{HeaderMap, StatusCode};
use bytes::{Bytes, BytesMut};

use crate::http::sink::{Flusher, Hijacked, Hijacker, ResponseSink};
use crate::rewrite::RewriteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
    Pending,
    Committed(StatusCode),
}

/// Decorates the real sink for the duration of one request.
pub struct ResponseInterceptor<'a> {
    inner: &'a mut dyn ResponseSink,
    buffer: BytesMut,
    state: HeaderState,
    preserve_last_modified: bool,
}

impl<'a> ResponseInterceptor<'a> {
    pub fn new(inner: &'a mut dyn ResponseSink, preserve_last_modified: bool) -> Self {
        Self {
            inner,
            buffer: BytesMut::new(),
            state: HeaderState::Pending,
            preserve_last_modified,
        }
    }

    pub fn state(&self) -> HeaderState {
        self.state
    }

    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Hand over the buffered body, releasing the real sink.
    pub fn into_body(self) -> Bytes {
        self.buffer.freeze()
    }
}

impl ResponseSink for ResponseInterceptor<'_> {
    fn headers(&mut self) -> &mut HeaderMap {
        self.inner.headers()
    }

    fn write_header(&mut self, status: StatusCode) {
        if let HeaderState::Committed(previous) = self.state {
            tracing::debug!(%previous, %status, "superfluous write_header call ignored");
            return;
        }

        let headers = self.inner.headers();
        if !self.preserve_last_modified {
            headers.remove(LAST_MODIFIED);
        }
        // The final body length is only known after rewriting.
        headers.remove(CONTENT_LENGTH);

        self.state = HeaderState::Committed(status);
        self.inner.write_header(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.state == HeaderState::Pending {
            self.write_header(StatusCode::OK);
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn as_hijacker(&mut self) -> Option<&mut dyn Hijacker> {
        Some(self)
    }

    fn as_flusher(&mut self) -> Option<&mut dyn Flusher> {
        Some(self)
    }
}

impl Hijacker for ResponseInterceptor<'_> {
    fn hijack(&mut self) -> Result<Hijacked, RewriteError> {
        let writer = self.inner.writer_name();
        match self.inner.as_hijacker() {
            Some(hijacker) => hijacker.hijack(),
            None => Err(RewriteError::NotHijacker { writer }),
        }
    }
}

impl Flusher for ResponseInterceptor<'_> {
    fn flush(&mut self) {
        // Flushing commits the headers on the real sink.
        if self.state == HeaderState::Pending {
            self.write_header(StatusCode::OK);
        }
        if let Some(flusher) = self.inner.as_flusher() {
            flusher.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::sink::ResponseRecorder;
    use axum::http::header::CONTENT_TYPE;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const DATE: &str = "Thu, 02 Jun 2016 06:01:08 GMT";

    fn upstream_headers(sink: &mut dyn ResponseSink) {
        let headers = sink.headers();
        headers.insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        headers.insert(CONTENT_LENGTH, "18".parse().unwrap());
        headers.insert(LAST_MODIFIED, DATE.parse().unwrap());
    }

    #[test]
    fn test_buffers_body_without_forwarding() {
        let mut recorder = ResponseRecorder::new();
        let mut interceptor = ResponseInterceptor::new(&mut recorder, false);
        interceptor.write(b"foo is ").unwrap();
        interceptor.write(b"the new bar").unwrap();
        assert_eq!(interceptor.buffered(), b"foo is the new bar");

        let body = interceptor.into_body();
        assert_eq!(&body[..], b"foo is the new bar");
        assert!(recorder.body().is_empty());
    }

    #[test]
    fn test_write_implies_ok() {
        let mut recorder = ResponseRecorder::new();
        let mut interceptor = ResponseInterceptor::new(&mut recorder, false);
        assert_eq!(interceptor.state(), HeaderState::Pending);
        interceptor.write(b"x").unwrap();
        assert_eq!(interceptor.state(), HeaderState::Committed(StatusCode::OK));
        drop(interceptor);
        assert_eq!(recorder.status(), StatusCode::OK);
    }

    #[test]
    fn test_commit_strips_headers() {
        let mut recorder = ResponseRecorder::new();
        let mut interceptor = ResponseInterceptor::new(&mut recorder, false);
        upstream_headers(&mut interceptor);
        interceptor.write_header(StatusCode::NOT_FOUND);
        drop(interceptor);

        let sent = recorder.sent_headers();
        assert_eq!(recorder.status(), StatusCode::NOT_FOUND);
        assert!(!sent.contains_key(CONTENT_LENGTH));
        assert!(!sent.contains_key(LAST_MODIFIED));
        assert_eq!(sent[CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_commit_preserves_last_modified() {
        let mut recorder = ResponseRecorder::new();
        let mut interceptor = ResponseInterceptor::new(&mut recorder, true);
        upstream_headers(&mut interceptor);
        interceptor.write_header(StatusCode::OK);
        drop(interceptor);

        assert_eq!(recorder.sent_headers()[LAST_MODIFIED], DATE);
        assert!(!recorder.sent_headers().contains_key(CONTENT_LENGTH));
    }

    #[test]
    fn test_second_write_header_ignored() {
        let mut recorder = ResponseRecorder::new();
        let mut interceptor = ResponseInterceptor::new(&mut recorder, false);
        interceptor.write_header(StatusCode::CREATED);
        interceptor.write_header(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(interceptor.state(), HeaderState::Committed(StatusCode::CREATED));
        drop(interceptor);
        assert_eq!(recorder.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_hijack_unsupported_names_writer() {
        let mut recorder = ResponseRecorder::new();
        let mut interceptor = ResponseInterceptor::new(&mut recorder, false);
        let err = interceptor.as_hijacker().unwrap().hijack().unwrap_err();
        assert!(matches!(err, RewriteError::NotHijacker { writer } if writer.ends_with("ResponseRecorder")));
        assert!(err.to_string().ends_with("ResponseRecorder is not a hijacker"));
    }

    #[test]
    fn test_flush_forwarded() {
        let mut recorder = ResponseRecorder::new();
        let mut interceptor = ResponseInterceptor::new(&mut recorder, false);
        interceptor.as_flusher().unwrap().flush();
        drop(interceptor);
        assert!(recorder.flushed());
    }

    /// Sink whose connection is a tokio duplex pipe.
    struct DuplexSink {
        headers: HeaderMap,
        conn: Option<tokio::io::DuplexStream>,
    }

    impl ResponseSink for DuplexSink {
        fn headers(&mut self) -> &mut HeaderMap {
            &mut self.headers
        }

        fn write_header(&mut self, _status: StatusCode) {}

        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn as_hijacker(&mut self) -> Option<&mut dyn Hijacker> {
            Some(self)
        }
    }

    impl Hijacker for DuplexSink {
        fn hijack(&mut self) -> Result<Hijacked, RewriteError> {
            let conn = self.conn.take().ok_or(RewriteError::NotHijacker {
                writer: "DuplexSink (already hijacked)",
            })?;
            Ok(Hijacked {
                io: Box::new(conn),
                read_buf: Bytes::from_static(b"pending"),
            })
        }
    }

    #[tokio::test]
    async fn test_hijack_forwarded_to_real_sink() {
        let (client, server) = tokio::io::duplex(64);
        let mut sink = DuplexSink {
            headers: HeaderMap::new(),
            conn: Some(server),
        };
        let mut interceptor = ResponseInterceptor::new(&mut sink, false);

        let mut hijacked = interceptor.as_hijacker().unwrap().hijack().unwrap();
        assert_eq!(&hijacked.read_buf[..], b"pending");

        hijacked.io.write_all(b"raw bytes").await.unwrap();
        drop(hijacked);

        let mut client = client;
        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"raw bytes");
    }
}
