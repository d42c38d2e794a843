//! codec::compress
//!
//! Whole-buffer compression for stored revision bodies.

use serde::{Deserialize, Serialize};

use super::CodecError;

/// How a stored body is compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionKind {
    /// Stored as-is.
    None,
    /// LZ4 block with the uncompressed size prepended.
    #[default]
    Lz4,
}

/// Compress `bytes` with `kind`.
pub fn compress(kind: CompressionKind, bytes: &[u8]) -> Vec<u8> {
    match kind {
        CompressionKind::None => bytes.to_vec(),
        CompressionKind::Lz4 => lz4_flex::compress_prepend_size(bytes),
    }
}

/// Expand bytes produced by [`compress`] with the same `kind`.
///
/// # Errors
///
/// [`CodecError::Decompression`] on a truncated or invalid stream.
pub fn expand(kind: CompressionKind, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    match kind {
        CompressionKind::None => Ok(bytes.to_vec()),
        CompressionKind::Lz4 => lz4_flex::decompress_size_prepended(bytes)
            .map_err(|e| CodecError::Decompression(e.to_string())),
    }
}

/// Compress with `preferred`, falling back to `None` when that does not
/// make the buffer smaller.
pub fn compress_best(preferred: CompressionKind, bytes: &[u8]) -> (CompressionKind, Vec<u8>) {
    if preferred == CompressionKind::None {
        return (CompressionKind::None, bytes.to_vec());
    }
    let packed = compress(preferred, bytes);
    if packed.len() < bytes.len() {
        (preferred, packed)
    } else {
        (CompressionKind::None, bytes.to_vec())
    }
}
