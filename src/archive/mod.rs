//! archive
//!
//! Archive model and durable store.
//!
//! # Modules
//!
//! - [`model`] - In-memory archive: header, branch views, revisions
//! - [`format`] - Durable image encoding
//! - [`store`] - Archive files on disk
//!
//! # Architecture
//!
//! An archive holds every revision of one file across all branches.
//! Revisions on the same lineage form a reverse-delta chain ending in a
//! full tip. Changes are staged in memory (`store_revision`, header edits)
//! and become durable in one atomic `commit`.
//!
//! # Example
//!
//! ```ignore
//! use branchvault::archive::{Archive, ArchiveStore, Placement};
//!
//! let mut archive = store.load(file_id)?;
//! let tip = archive.trunk_tip();
//! let id = archive.store_revision(Placement::Extend(tip), revision, CompressionKind::Lz4)?;
//! store.commit(&mut archive)?;
//! ```

pub mod format;
pub mod model;
pub mod store;

pub use model::{
    Archive, ArchiveHeader, Attributes, BranchView, CemeteryRecord, Label, LockRecord,
    NewRevision, Placement, PromotionRecord, RevisionBody, RevisionEntry,
};
pub use store::ArchiveStore;

use thiserror::Error;

use crate::core::types::{FileId, RevisionId};

/// Errors from archive operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("revision {revision} not found in archive {file_id}")]
    RevisionNotFound {
        file_id: FileId,
        revision: RevisionId,
    },

    #[error("corrupt archive data in {file_id}: {detail}")]
    Corrupt { file_id: FileId, detail: String },

    #[error("revision {expected} is not the tip of its lineage in archive {file_id} (tip is {actual:?})")]
    StaleTip {
        file_id: FileId,
        expected: RevisionId,
        actual: Option<RevisionId>,
    },

    #[error("archive {0} not found")]
    NotFound(FileId),

    #[error("i/o failure during {op} of archive {file_id}: {source}")]
    Io {
        file_id: FileId,
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to scan archive directory: {0}")]
    Scan(#[source] std::io::Error),
}

/// Read access to stored revision content.
pub trait RevisionSource {
    /// Exact bytes of `revision`.
    fn fetch(&self, revision: &RevisionId) -> Result<Vec<u8>, ArchiveError>;
}

impl RevisionSource for Archive {
    fn fetch(&self, revision: &RevisionId) -> Result<Vec<u8>, ArchiveError> {
        self.fetch_revision(revision)
    }
}
