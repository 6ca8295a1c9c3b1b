//! Gzip framing of request bodies

use crate::utils::error::{MetricsError, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};

/// Value of the `Content-Encoding` header for gzip bodies
pub const GZIP_ENCODING: &str = "gzip";

/// Compress `data` with gzip
pub fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress a gzip body, refusing to inflate past `limit` bytes
pub fn gunzip(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data)
        .take(limit as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| MetricsError::validation(format!("invalid gzip data: {}", e)))?;

    if out.len() > limit {
        return Err(MetricsError::validation(format!(
            "decompressed body exceeds {} bytes",
            limit
        )));
    }
    Ok(out)
}

/// Whether a `Content-Encoding` header value names gzip
pub fn is_gzip(content_encoding: Option<&str>) -> bool {
    content_encoding.is_some_and(|value| {
        value
            .split(',')
            .any(|part| part.trim().eq_ignore_ascii_case(GZIP_ENCODING))
    })
}
