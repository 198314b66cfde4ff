//! Internal helpers re-exported for integration tests.
//!
//! Provides log capture for asserting on cache hit/miss diagnostics and a
//! gzip encoder for serving artifact payloads from mock servers.

mod logging;

pub use logging::{capture_debug_logs, capture_logs};

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

/// Gzip-compresses `payload` the way the artifact stores publish binaries.
///
/// # Examples
/// ```
/// use prisma_engine_fetch::test_support::gzip_bytes;
///
/// let compressed = gzip_bytes(b"ENGINE_BINARY_CONTENT");
/// assert_eq!(compressed.get(..2), Some(&[0x1f, 0x8b][..]));
/// ```
#[must_use]
pub fn gzip_bytes(payload: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    // Writing into a Vec cannot fail.
    drop(encoder.write_all(payload));
    encoder.finish().unwrap_or_default()
}
