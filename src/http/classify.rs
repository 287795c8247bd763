//! Content classification.
//!
//! Decides, from response headers alone, whether a body may be rewritten
//! and whether it must be decoded first.

use axum::http::header::{CONTENT_ENCODING, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};

/// Compression state declared by Content-Encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingClass {
    /// Absent, empty or `identity`.
    Identity,
    /// The one format the codec handles.
    Supported,
    /// Anything else; carries the declared token.
    Unsupported(String),
}

/// What to do with a buffered body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyAction {
    PassThrough,
    Rewrite,
    DecodeRewriteEncode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub text: bool,
    pub encoding: EncodingClass,
}

impl Classification {
    pub fn action(&self) -> BodyAction {
        match (self.text, &self.encoding) {
            (false, _) => BodyAction::PassThrough,
            (true, EncodingClass::Identity) => BodyAction::Rewrite,
            (true, EncodingClass::Supported) => BodyAction::DecodeRewriteEncode,
            (true, EncodingClass::Unsupported(_)) => BodyAction::PassThrough,
        }
    }
}

/// Classify a response. `supported` is the codec's Content-Encoding token.
///
/// Only the first value of each header is considered.
pub fn classify(headers: &HeaderMap, supported: &str) -> Classification {
    let content_type = header_str(headers.get(CONTENT_TYPE)).to_ascii_lowercase();
    let text = content_type.is_empty() || content_type.contains("text");

    let encoding = header_str(headers.get(CONTENT_ENCODING));
    let encoding = encoding.trim();
    let encoding = if encoding.is_empty() || encoding.eq_ignore_ascii_case("identity") {
        EncodingClass::Identity
    } else if encoding.eq_ignore_ascii_case(supported) {
        EncodingClass::Supported
    } else {
        EncodingClass::Unsupported(encoding.to_string())
    };

    Classification { text, encoding }
}

fn header_str(value: Option<&HeaderValue>) -> String {
    value
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}
