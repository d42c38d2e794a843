//! promote
//!
//! Folding a child branch's changes to one archive into its parent branch.
//!
//! # Modules
//!
//! - [`info`] - Promotion types, classification and candidate discovery
//! - [`merge`] - Three-way line merge
//! - [`engine`] - Per-file promotion against an archive
//! - [`workarea`] - Read-only view of users' working directories
//!
//! # Architecture
//!
//! A promotion request is a [`FilePromotionInfo`]. [`promote_file`] applies
//! it to one in-memory archive while the caller holds that archive
//! exclusively, then the caller commits. Content results (merged buffer or
//! conflict buffers) are returned, never written to a working directory.
//!
//! # Invariants
//!
//! - Only a direct parent can receive a promotion
//! - After a content promotion the child's own tip is cleared, so the child
//!   resolves to the parent's tip even when the merge conflicted
//! - A promotion already recorded in the archive's ledger is a no-op

pub mod engine;
pub mod info;
pub mod merge;
pub mod workarea;

pub use engine::{promote_file, PromoteOutcome, PromoteResult, PromotionContext};
pub use info::{deduce_promotion_type, promotion_candidate, FilePromotionInfo, MergeFlags, PromotionType};
pub use merge::{three_way_merge, MergeOutcome};
pub use workarea::{DirWorkArea, NoWorkArea, WorkArea};

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::core::types::{ArchiveLocation, BranchName, FileId};

/// Errors from promotion.
#[derive(Debug, Error)]
pub enum PromoteError {
    #[error("unsupported promotion type '{0}'")]
    UnsupportedPromotionType(String),

    #[error("'{target}' is not the parent of '{branch}'")]
    NotParent {
        branch: BranchName,
        target: BranchName,
    },

    #[error("'{0}' has no parent to promote into")]
    RootBranch(BranchName),

    #[error("archive {file_id} was not created on '{branch}'")]
    NotCreatedOnBranch { file_id: FileId, branch: BranchName },

    #[error("'{location}' is already a controlled file on '{branch}'")]
    ControlledCollision {
        location: ArchiveLocation,
        branch: BranchName,
    },

    #[error("archive {file_id} has locked revisions and cannot be deleted on '{branch}'")]
    Locked { file_id: FileId, branch: BranchName },

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}
