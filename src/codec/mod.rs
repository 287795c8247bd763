//! Reversible body compression.
//!
//! # Responsibilities
//! - Decode a compressed body before rewriting
//! - Re-encode the rewritten body in the same format
//!
//! # Design Decisions
//! - Exactly one format is supported per rewriter; the classifier compares
//!   Content-Encoding against [`Codec::encoding`]
//! - Codec errors are plain `io::Error`; the caller decides the fallback

pub mod gzip;

use std::fmt::Debug;
use std::io;

pub use gzip::Gzip;

/// A compression format the rewriter can undo and redo.
pub trait Codec: Send + Sync + Debug {
    /// Content-Encoding token this codec handles (e.g. `gzip`).
    fn encoding(&self) -> &'static str;

    fn decode(&self, input: &[u8]) -> io::Result<Vec<u8>>;

    fn encode(&self, input: &[u8]) -> io::Result<Vec<u8>>;
}
