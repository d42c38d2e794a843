//! codec::diff
//!
//! Line-oriented diff producing byte-addressed edits.
//!
//! # Architecture
//!
//! Both buffers are split into lines (each line ends after `\n`; a trailing
//! partial line counts as a line). A Myers shortest-edit-script search over
//! the middle section (after trimming the common prefix and suffix) yields
//! runs of deleted and inserted lines. Each run becomes one [`Edit`]
//! addressed by byte offset into the *from* buffer.
//!
//! # Invariants
//!
//! - Edits are sorted by `seek` and never overlap
//! - Applying the edits to `from` yields `to` exactly

use serde::{Deserialize, Serialize};

/// Shape of an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditKind {
    Insert,
    Delete,
    Replace,
}

impl EditKind {
    pub(crate) fn tag(self) -> u8 {
        match self {
            EditKind::Insert => 0,
            EditKind::Delete => 1,
            EditKind::Replace => 2,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(EditKind::Insert),
            1 => Some(EditKind::Delete),
            2 => Some(EditKind::Replace),
            _ => None,
        }
    }
}

/// A change to a base buffer: remove `deleted` bytes at `seek`, then insert
/// `inserted` there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edit {
    pub seek: u64,
    pub deleted: u64,
    pub inserted: Vec<u8>,
}

impl Edit {
    pub fn kind(&self) -> EditKind {
        match (self.deleted, self.inserted.is_empty()) {
            (0, _) => EditKind::Insert,
            (_, true) => EditKind::Delete,
            _ => EditKind::Replace,
        }
    }

    /// First byte past the replaced range.
    pub fn end(&self) -> u64 {
        self.seek + self.deleted
    }

    pub fn is_insert(&self) -> bool {
        self.deleted == 0
    }
}

/// Split after every `\n`; a trailing partial line is kept.
pub fn split_lines(bytes: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'\n' {
            lines.push(&bytes[start..=i]);
            start = i + 1;
        }
    }
    if start < bytes.len() {
        lines.push(&bytes[start..]);
    }
    lines
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal(usize),
    Delete(usize),
    Insert(usize),
}

/// Compute the edits that turn `from` into `to`.
///
/// # Example
///
/// ```
/// use branchvault::codec::diff_lines;
///
/// let edits = diff_lines(b"a\nb\nc\n", b"a\nB\nc\n");
/// assert_eq!(edits.len(), 1);
/// assert_eq!(edits[0].seek, 2);
/// assert_eq!(edits[0].deleted, 2);
/// assert_eq!(edits[0].inserted, b"B\n");
/// ```
pub fn diff_lines(from: &[u8], to: &[u8]) -> Vec<Edit> {
    if from == to {
        return Vec::new();
    }

    let a = split_lines(from);
    let b = split_lines(to);

    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];
    let ops = shortest_edit_script(a_mid, b_mid);

    let mut edits = Vec::new();
    let mut seek: u64 = a[..prefix].iter().map(|l| l.len() as u64).sum();
    let mut pending: Option<Edit> = None;

    for op in ops {
        match op {
            Op::Equal(i) => {
                if let Some(edit) = pending.take() {
                    seek = edit.end();
                    edits.push(edit);
                }
                seek += a_mid[i].len() as u64;
            }
            Op::Delete(i) => {
                let edit = pending.get_or_insert_with(|| Edit {
                    seek,
                    deleted: 0,
                    inserted: Vec::new(),
                });
                edit.deleted += a_mid[i].len() as u64;
            }
            Op::Insert(j) => {
                let edit = pending.get_or_insert_with(|| Edit {
                    seek,
                    deleted: 0,
                    inserted: Vec::new(),
                });
                edit.inserted.extend_from_slice(b_mid[j]);
            }
        }
    }
    if let Some(edit) = pending.take() {
        edits.push(edit);
    }
    edits
}

/// Myers O((N+M)D) search, returning ops in forward order.
fn shortest_edit_script(a: &[&[u8]], b: &[&[u8]]) -> Vec<Op> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = n + m;
    let offset = max + 1;
    let mut v = vec![0isize; (2 * max + 3) as usize];
    // trace[d] holds v[-(d+1) ..= d+1] as it was before round d
    let mut trace: Vec<Vec<isize>> = Vec::new();
    let mut final_d = 0;

    'search: for d in 0..=max {
        let lo = (offset - d - 1) as usize;
        let hi = (offset + d + 1) as usize;
        trace.push(v[lo..=hi].to_vec());

        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx] = x;
            if x >= n && y >= m {
                final_d = d;
                break 'search;
            }
            k += 2;
        }
    }

    let mut ops = Vec::new();
    let mut x = n;
    let mut y = m;
    for d in (0..=final_d).rev() {
        let snapshot = &trace[d as usize];
        let at = |k: isize| snapshot[(k + d + 1) as usize];
        let k = x - y;
        let prev_k = if k == -d || (k != d && at(k - 1) < at(k + 1)) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = if d == 0 { 0 } else { at(prev_k) };
        let prev_y = if d == 0 { 0 } else { prev_x - prev_k };

        while x > prev_x && y > prev_y {
            ops.push(Op::Equal((x - 1) as usize));
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            if x == prev_x {
                ops.push(Op::Insert((y - 1) as usize));
            } else {
                ops.push(Op::Delete((x - 1) as usize));
            }
        }
        x = prev_x;
        y = prev_y;
    }
    ops.reverse();
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::apply_edits;

    fn roundtrip(from: &[u8], to: &[u8]) -> Vec<Edit> {
        let edits = diff_lines(from, to);
        assert_eq!(apply_edits(from, &edits).unwrap(), to);
        edits
    }

    #[test]
    fn split_keeps_trailing_partial_line() {
        assert_eq!(split_lines(b"a\nb"), vec![&b"a\n"[..], &b"b"[..]]);
        assert_eq!(split_lines(b"a\n\n"), vec![&b"a\n"[..], &b"\n"[..]]);
        assert!(split_lines(b"").is_empty());
    }

    #[test]
    fn identical_inputs_have_no_edits() {
        assert!(diff_lines(b"same\n", b"same\n").is_empty());
    }

    #[test]
    fn pure_insert_and_delete() {
        let edits = roundtrip(b"a\nc\n", b"a\nb\nc\n");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].kind(), EditKind::Insert);
        assert_eq!(edits[0].seek, 2);

        let edits = roundtrip(b"a\nb\nc\n", b"a\nc\n");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].kind(), EditKind::Delete);
        assert_eq!(edits[0].deleted, 2);
    }

    #[test]
    fn separate_hunks_are_sorted_and_disjoint() {
        let from = b"1\n2\n3\n4\n5\n6\n";
        let to = b"1\nTWO\n3\n4\nFIVE\n6\n";
        let edits = roundtrip(from, to);
        assert_eq!(edits.len(), 2);
        assert!(edits[0].end() <= edits[1].seek);
        assert!(edits.iter().all(|e| e.kind() == EditKind::Replace));
    }

    #[test]
    fn empty_sides() {
        roundtrip(b"", b"new\ncontent");
        roundtrip(b"old\ncontent", b"");
    }

    #[test]
    fn missing_final_newline_is_a_change() {
        let edits = roundtrip(b"a\nb", b"a\nb\n");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].seek, 2);
    }

    #[test]
    fn interleaved_changes() {
        roundtrip(
            b"x\na\ny\nb\nz\nc\n",
            b"a\nq\nb\nc\nr\n",
        );
    }

    #[test]
    fn tag_roundtrip() {
        for kind in [EditKind::Insert, EditKind::Delete, EditKind::Replace] {
            assert_eq!(EditKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(EditKind::from_tag(9), None);
    }
}
