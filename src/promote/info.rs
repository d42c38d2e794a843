//! promote::info
//!
//! Promotion requests: what kind of change a child branch made to a file
//! and where it should go.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PromoteError;
use crate::archive::Archive;
use crate::core::graph::BranchGraph;
use crate::core::types::{ArchiveLocation, BranchName, FileId, RevisionId};
use crate::tree;

/// Kind of change being folded into the parent branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionType {
    /// Content edit only.
    Simple,
    /// The file was created on the child branch.
    FileCreated,
    /// The file was deleted on the child branch.
    FileDeleted,
    /// Renamed on the child branch.
    FileNameChange,
    /// Moved to another directory on the child branch.
    FileLocationChange,
    /// Renamed and moved on the child branch.
    LocationAndNameDiffer,
}

impl PromotionType {
    pub const ALL: [PromotionType; 6] = [
        PromotionType::Simple,
        PromotionType::FileCreated,
        PromotionType::FileDeleted,
        PromotionType::FileNameChange,
        PromotionType::FileLocationChange,
        PromotionType::LocationAndNameDiffer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PromotionType::Simple => "simple",
            PromotionType::FileCreated => "file_created",
            PromotionType::FileDeleted => "file_deleted",
            PromotionType::FileNameChange => "file_name_change",
            PromotionType::FileLocationChange => "file_location_change",
            PromotionType::LocationAndNameDiffer => "location_and_name_differ",
        }
    }

    /// Whether the promotion copies a name or path onto the parent.
    pub fn relocates(self) -> bool {
        matches!(
            self,
            PromotionType::FileNameChange
                | PromotionType::FileLocationChange
                | PromotionType::LocationAndNameDiffer
        )
    }
}

impl FromStr for PromotionType {
    type Err = PromoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PromoteError::UnsupportedPromotionType(s.to_string()))
    }
}

impl fmt::Display for PromotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What changed about a file on a child branch relative to its parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeFlags {
    pub name_changed: bool,
    pub location_changed: bool,
    pub created_on_branch: bool,
    pub deleted_on_branch: bool,
}

/// Classify a child-branch change.
///
/// Creation wins over deletion, deletion over renames and moves.
///
/// # Example
///
/// ```
/// use branchvault::promote::{deduce_promotion_type, MergeFlags, PromotionType};
///
/// let flags = MergeFlags { name_changed: true, location_changed: true, ..Default::default() };
/// assert_eq!(deduce_promotion_type(flags), PromotionType::LocationAndNameDiffer);
/// assert_eq!(deduce_promotion_type(MergeFlags::default()), PromotionType::Simple);
/// ```
pub fn deduce_promotion_type(flags: MergeFlags) -> PromotionType {
    match flags {
        MergeFlags {
            created_on_branch: true,
            ..
        } => PromotionType::FileCreated,
        MergeFlags {
            deleted_on_branch: true,
            ..
        } => PromotionType::FileDeleted,
        MergeFlags {
            name_changed: true,
            location_changed: true,
            ..
        } => PromotionType::LocationAndNameDiffer,
        MergeFlags {
            name_changed: true,
            ..
        } => PromotionType::FileNameChange,
        MergeFlags {
            location_changed: true,
            ..
        } => PromotionType::FileLocationChange,
        _ => PromotionType::Simple,
    }
}

/// A ready-to-run promotion of one file from a branch into its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePromotionInfo {
    pub file_id: FileId,
    pub source_branch: BranchName,
    pub target_branch: BranchName,
    pub promotion_type: PromotionType,
    /// Child tip when the request was built; `None` if the branch has no
    /// revision of its own.
    pub source_revision: Option<RevisionId>,
    /// Where the file lives on the child branch.
    pub source_location: ArchiveLocation,
    /// Where the file lives on the parent branch; `None` if absent there.
    pub target_location: Option<ArchiveLocation>,
}

/// Describe the pending change of `archive` on `branch`, if any.
///
/// Returns `None` for trunk, for archives not reachable from `branch`, and
/// for archives with nothing to promote. A file both created and deleted on
/// the branch has nothing to promote.
pub fn promotion_candidate(
    archive: &Archive,
    graph: &BranchGraph,
    branch: &BranchName,
) -> Option<FilePromotionInfo> {
    let parent = graph.parent(branch)?.clone();
    let header = archive.header();
    if header.cemetery.is_some() {
        return None;
    }
    if let Some(origin) = &header.origin {
        if !graph.is_self_or_ancestor(origin, branch) {
            return None;
        }
    }
    if graph
        .ancestors(branch)
        .iter()
        .any(|b| header.view(b).is_some_and(|v| v.deleted))
    {
        return None;
    }

    let view = header.view(branch).cloned().unwrap_or_default();
    let created_on_branch = header.origin.as_ref() == Some(branch);
    if created_on_branch && view.deleted {
        return None;
    }

    let source_location = tree::resolve_location(archive, graph, branch);
    let parent_location = tree::resolve_location(archive, graph, &parent);
    let flags = MergeFlags {
        name_changed: source_location.short_name() != parent_location.short_name(),
        location_changed: source_location.appended_path() != parent_location.appended_path(),
        created_on_branch,
        deleted_on_branch: view.deleted,
    };

    let promotion_type = deduce_promotion_type(flags);
    if promotion_type == PromotionType::Simple && view.tip.is_none() {
        return None;
    }

    Some(FilePromotionInfo {
        file_id: archive.file_id(),
        source_branch: branch.clone(),
        target_branch: parent,
        promotion_type,
        source_revision: view.tip,
        source_location,
        target_location: (!created_on_branch).then_some(parent_location),
    })
}
