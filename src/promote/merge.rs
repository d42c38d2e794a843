//! promote::merge
//!
//! Three-way merge over byte-addressed line edits.
//!
//! # Architecture
//!
//! Both sides are diffed against the common ancestor. Edits made
//! identically on both sides collapse to one. Two remaining edits overlap
//! when:
//!
//! - their replaced ranges intersect
//! - both insert at the same offset
//! - one inserts strictly inside the range the other replaces
//!
//! Without overlap, the union of edits is applied to the ancestor, inserts
//! ahead of a range edit starting at the same offset.

use crate::codec::{self, Edit};

/// Result of a three-way merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Clean(Vec<u8>),
    /// Number of overlapping edit pairs found.
    Overlap(usize),
}

fn overlaps(a: &Edit, b: &Edit) -> bool {
    match (a.is_insert(), b.is_insert()) {
        (true, true) => a.seek == b.seek,
        (true, false) => b.seek < a.seek && a.seek < b.end(),
        (false, true) => a.seek < b.seek && b.seek < a.end(),
        (false, false) => a.seek < b.end() && b.seek < a.end(),
    }
}

/// Merge `parent` and `child`, both derived from `ancestor`.
///
/// # Example
///
/// ```
/// use branchvault::promote::{three_way_merge, MergeOutcome};
///
/// let ancestor = b"a\nb\nc\n";
/// let parent = b"A\nb\nc\n";
/// let child = b"a\nb\nC\n";
/// assert_eq!(
///     three_way_merge(ancestor, parent, child),
///     MergeOutcome::Clean(b"A\nb\nC\n".to_vec())
/// );
/// ```
pub fn three_way_merge(ancestor: &[u8], parent: &[u8], child: &[u8]) -> MergeOutcome {
    let parent_edits = codec::diff_lines(ancestor, parent);
    let child_edits: Vec<Edit> = codec::diff_lines(ancestor, child)
        .into_iter()
        .filter(|e| !parent_edits.contains(e))
        .collect();

    let conflicts = parent_edits
        .iter()
        .flat_map(|p| child_edits.iter().filter(move |c| overlaps(p, c)))
        .count();
    if conflicts > 0 {
        return MergeOutcome::Overlap(conflicts);
    }

    let mut merged: Vec<Edit> = parent_edits.into_iter().chain(child_edits).collect();
    merged.sort_by_key(|e| (e.seek, !e.is_insert()));

    match codec::apply_edits(ancestor, &merged) {
        Ok(content) => MergeOutcome::Clean(content),
        Err(e) => {
            tracing::warn!(error = %e, "merged edits did not apply; treating as overlap");
            MergeOutcome::Overlap(1)
        }
    }
}
