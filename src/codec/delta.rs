//! codec::delta
//!
//! Reverse-delta scripts.
//!
//! A script rebuilds an older revision from a newer one. Layout (all
//! integers little-endian):
//!
//! ```text
//! "BVD1" | base_size u64 | result_size u64 | edit_count u32
//! edit_count x ( kind u8 | seek u64 | deleted u64 | inserted_len u64 | inserted bytes )
//! ```
//!
//! `seek` addresses the base. Edits are ascending and non-overlapping.

use super::diff::{diff_lines, Edit, EditKind};
use super::CodecError;

const SCRIPT_MAGIC: &[u8; 4] = b"BVD1";

/// Build the script that turns `newer` back into `older`.
pub fn reverse_delta(newer: &[u8], older: &[u8]) -> Vec<u8> {
    let edits = diff_lines(newer, older);
    encode_script(newer.len() as u64, older.len() as u64, &edits)
}

fn encode_script(base_size: u64, result_size: u64, edits: &[Edit]) -> Vec<u8> {
    let payload: usize = edits.iter().map(|e| 25 + e.inserted.len()).sum();
    let mut out = Vec::with_capacity(24 + payload);
    out.extend_from_slice(SCRIPT_MAGIC);
    out.extend_from_slice(&base_size.to_le_bytes());
    out.extend_from_slice(&result_size.to_le_bytes());
    out.extend_from_slice(&(edits.len() as u32).to_le_bytes());
    for edit in edits {
        out.push(edit.kind().tag());
        out.extend_from_slice(&edit.seek.to_le_bytes());
        out.extend_from_slice(&edit.deleted.to_le_bytes());
        out.extend_from_slice(&(edit.inserted.len() as u64).to_le_bytes());
        out.extend_from_slice(&edit.inserted);
    }
    out
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| CodecError::MalformedScript("truncated script".into()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn u64(&mut self) -> Result<u64, CodecError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }
}

/// Rebuild the prior revision from `base` and a script produced by
/// [`reverse_delta`].
///
/// # Errors
///
/// Any malformed script, base-size mismatch or out-of-range edit.
pub fn apply_reverse_delta(base: &[u8], script: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut reader = Reader {
        bytes: script,
        pos: 0,
    };
    if reader.take(4)? != SCRIPT_MAGIC {
        return Err(CodecError::MalformedScript("bad magic".into()));
    }
    let base_size = reader.u64()?;
    let result_size = reader.u64()?;
    let count = reader.u32()?;

    if base_size != base.len() as u64 {
        return Err(CodecError::BaseMismatch {
            expected: base_size,
            actual: base.len() as u64,
        });
    }

    let mut edits = Vec::new();
    for _ in 0..count {
        let tag = reader.u8()?;
        let kind = EditKind::from_tag(tag)
            .ok_or_else(|| CodecError::MalformedScript(format!("unknown edit kind {tag}")))?;
        let seek = reader.u64()?;
        let deleted = reader.u64()?;
        let inserted_len = usize::try_from(reader.u64()?)
            .map_err(|_| CodecError::MalformedScript("insert length overflow".into()))?;
        let inserted = reader.take(inserted_len)?.to_vec();
        let edit = Edit {
            seek,
            deleted,
            inserted,
        };
        if edit.kind() != kind {
            return Err(CodecError::MalformedScript(format!(
                "edit at {seek} is tagged {kind:?} but shaped {:?}",
                edit.kind()
            )));
        }
        edits.push(edit);
    }
    if reader.pos != script.len() {
        return Err(CodecError::MalformedScript("trailing bytes".into()));
    }

    let result = apply_edits(base, &edits)?;
    if result.len() as u64 != result_size {
        return Err(CodecError::MalformedScript(format!(
            "rebuilt {} bytes, expected {result_size}",
            result.len()
        )));
    }
    Ok(result)
}

/// Apply ascending, non-overlapping edits to `base`.
///
/// Several edits may share a `seek` as long as every one but the last is an
/// insert.
///
/// # Errors
///
/// [`CodecError::EditOutOfRange`] when an edit runs past the base or starts
/// before the end of the previous one.
pub fn apply_edits(base: &[u8], edits: &[Edit]) -> Result<Vec<u8>, CodecError> {
    let len = base.len() as u64;
    let mut out = Vec::with_capacity(base.len());
    let mut cursor: u64 = 0;

    for edit in edits {
        let end = edit.seek.checked_add(edit.deleted);
        match end {
            Some(end) if edit.seek >= cursor && end <= len => {
                out.extend_from_slice(&base[cursor as usize..edit.seek as usize]);
                out.extend_from_slice(&edit.inserted);
                cursor = end;
            }
            _ => {
                return Err(CodecError::EditOutOfRange {
                    seek: edit.seek,
                    deleted: edit.deleted,
                    len,
                })
            }
        }
    }
    out.extend_from_slice(&base[cursor as usize..]);
    Ok(out)
}
