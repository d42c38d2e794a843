//! codec
//!
//! Pure byte transforms used by the archive store and working copies:
//! compression, line diff, reverse-delta scripts and keyword expansion.
//!
//! # Modules
//!
//! - [`compress`] - Whole-buffer compression (`None`, `Lz4`)
//! - [`diff`] - Line-oriented diff producing byte-addressed edits
//! - [`delta`] - Reverse-delta script encoding and application
//! - [`keywords`] - `$Name$` keyword expansion and contraction
//!
//! # Invariants
//!
//! - `expand(kind, compress(kind, b)) == b` for every kind
//! - `apply_reverse_delta(newer, reverse_delta(newer, older)) == older`
//! - A malformed input is an error; partial output is never returned
//!
//! # Example
//!
//! ```
//! use branchvault::codec::{apply_reverse_delta, reverse_delta};
//!
//! let older = b"alpha\nbeta\n";
//! let newer = b"alpha\nBETA\ngamma\n";
//! let script = reverse_delta(newer, older);
//! assert_eq!(apply_reverse_delta(newer, &script).unwrap(), older);
//! ```

pub mod compress;
pub mod delta;
pub mod diff;
pub mod keywords;

pub use compress::{compress, compress_best, expand, CompressionKind};
pub use delta::{apply_edits, apply_reverse_delta, reverse_delta};
pub use diff::{diff_lines, split_lines, Edit, EditKind};

use thiserror::Error;

/// Errors from decoding stored bytes. Every variant means the stored data
/// is corrupt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("corrupt archive data: malformed delta script: {0}")]
    MalformedScript(String),

    #[error("corrupt archive data: delta expects a {expected}-byte base, got {actual}")]
    BaseMismatch { expected: u64, actual: u64 },

    #[error("corrupt archive data: edit at {seek} (+{deleted}) exceeds {len}-byte base")]
    EditOutOfRange { seek: u64, deleted: u64, len: u64 },

    #[error("corrupt archive data: decompression failed: {0}")]
    Decompression(String),
}
