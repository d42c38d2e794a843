//! archive::format
//!
//! Durable archive image.
//!
//! ```text
//! b"BVARCH\0\x01" | bincode(standard config) of { header, revisions }
//! ```
//!
//! Revision bodies are stored already compressed, so the image itself is
//! not compressed again.

use serde::{Deserialize, Serialize};

use super::model::{Archive, ArchiveHeader, RevisionEntry, FORMAT_VERSION};
use super::ArchiveError;
use crate::core::types::FileId;

/// Leading bytes of every archive file.
pub const IMAGE_MAGIC: &[u8; 8] = b"BVARCH\0\x01";

#[derive(Serialize)]
struct ImageRef<'a> {
    header: &'a ArchiveHeader,
    revisions: Vec<RevisionEntry>,
}

#[derive(Deserialize)]
struct Image {
    header: ArchiveHeader,
    revisions: Vec<RevisionEntry>,
}

/// Serialize an archive to its durable form.
pub fn encode(archive: &Archive) -> Result<Vec<u8>, ArchiveError> {
    let image = ImageRef {
        header: archive.header(),
        revisions: archive.revisions_vec(),
    };
    let body = bincode::serde::encode_to_vec(&image, bincode::config::standard()).map_err(|e| {
        ArchiveError::Corrupt {
            file_id: archive.file_id(),
            detail: format!("encode failed: {e}"),
        }
    })?;

    let mut out = Vec::with_capacity(IMAGE_MAGIC.len() + body.len());
    out.extend_from_slice(IMAGE_MAGIC);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Parse a durable image. `expected` is the id the file was looked up by.
pub fn decode(expected: FileId, bytes: &[u8]) -> Result<Archive, ArchiveError> {
    let corrupt = |detail: String| ArchiveError::Corrupt {
        file_id: expected,
        detail,
    };

    let body = bytes
        .strip_prefix(IMAGE_MAGIC.as_slice())
        .ok_or_else(|| corrupt("missing archive magic".into()))?;
    let (image, read): (Image, usize) =
        bincode::serde::decode_from_slice(body, bincode::config::standard())
            .map_err(|e| corrupt(format!("decode failed: {e}")))?;

    if read != body.len() {
        return Err(corrupt(format!("{} trailing bytes", body.len() - read)));
    }
    if image.header.file_id != expected {
        return Err(corrupt(format!(
            "file holds archive {}",
            image.header.file_id
        )));
    }
    if image.header.format_version > FORMAT_VERSION {
        return Err(corrupt(format!(
            "format version {} is newer than supported {FORMAT_VERSION}",
            image.header.format_version
        )));
    }

    Ok(Archive::from_parts(image.header, image.revisions))
}
