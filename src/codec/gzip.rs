//! gzip codec backed by flate2.

use std::io::{self, Read, Write};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::Codec;

/// Upper bound on a decompressed body. Larger bodies fail to decode and
/// are passed through untouched.
pub const READ_LIMIT: u64 = 64 * 1024 * 1024;

/// gzip with default compression settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gzip;

impl Codec for Gzip {
    fn encoding(&self) -> &'static str {
        "gzip"
    }

    fn decode(&self, input: &[u8]) -> io::Result<Vec<u8>> {
        decode_limited(input, READ_LIMIT)
    }

    fn encode(&self, input: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(input.len() / 2), Compression::default());
        encoder.write_all(input)?;
        encoder.finish()
    }
}

fn decode_limited(input: &[u8], limit: u64) -> io::Result<Vec<u8>> {
    // Concatenated members are read as one stream.
    let mut decoder = MultiGzDecoder::new(input).take(limit.saturating_add(1));
    let mut decoded = Vec::with_capacity(input.len().saturating_mul(2));
    decoder.read_to_end(&mut decoded)?;

    if decoded.len() as u64 > limit {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("decompressed body exceeds {limit} bytes"),
        ));
    }
    Ok(decoded)
}
