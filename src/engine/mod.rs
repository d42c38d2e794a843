//! engine
//!
//! The project façade: every client operation enters here.
//!
//! # Modules
//!
//! - [`project`] - Opening a project, branch graph, archive sections
//! - [`files`] - Archive creation, checkin, fetch, rename, delete
//! - [`locking`] - Locks and labels
//! - [`promotion`] - Promotion candidates and (batch) promotion
//!
//! # Architecture
//!
//! A [`Project`] owns everything for one project root: the branch graph,
//! the archive store, an in-memory map of archives each behind its own
//! `RwLock`, the lock registry, and the transaction manager. No state is
//! process-global.
//!
//! Mutations follow one pattern: take the archive's exclusive section,
//! apply the change to a copy, commit the copy durably, then publish it.
//! A failed operation therefore leaves both the file and the in-memory
//! archive as they were.
//!
//! # Invariants
//!
//! - One process owns a project (OS lock on `<root>/lock`)
//! - Lock order is namespace, then branch graph, then archive
//! - Read-only branches take labels and lock releases, nothing else
//! - An archive visible in memory always matches its committed file
//!
//! # Example
//!
//! ```ignore
//! use branchvault::engine::Project;
//!
//! let project = Project::open(root)?;
//! let ctx = project.begin(user);
//! let id = project.create_archive(&ctx, &trunk, location, b"hello\n".to_vec(), "first", None)?;
//! project.end(&ctx);
//! ```

pub mod files;
pub mod locking;
pub mod project;
pub mod promotion;

pub use files::RevisionSelector;
pub use project::Project;

use std::path::PathBuf;

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::core::config::ConfigError;
use crate::core::graph::GraphError;
use crate::core::ops::ProjectLockError;
use crate::core::types::{ArchiveLocation, BranchName, FileId, RevisionId, TypeError};
use crate::locks::LockError;
use crate::promote::PromoteError;
use crate::tree::TreeError;
use crate::txn::TxnError;

/// Execution context for CLI commands.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Project root override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// User name override.
    pub user: Option<String>,
}

/// Errors from project operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no project at {0}; run `bv init` first")]
    NotInitialized(PathBuf),

    #[error("archive {0} is not part of this project")]
    UnknownArchive(FileId),

    #[error("archive {file_id} does not exist on branch '{branch}'")]
    NotVisible { file_id: FileId, branch: BranchName },

    #[error("'{0}' is inside a reserved directory")]
    ReservedLocation(ArchiveLocation),

    #[error("'{location}' is already a controlled file on '{branch}'")]
    AlreadyControlled {
        location: ArchiveLocation,
        branch: BranchName,
    },

    #[error("checkin to archive {file_id} requires holding the lock on {revision}")]
    LockRequired { file_id: FileId, revision: RevisionId },

    #[error("archive {0} has locked revisions")]
    Locked(FileId),

    #[error("branch '{0}' is read-only")]
    ReadOnlyBranch(BranchName),

    #[error("archive {file_id} is not deleted on '{branch}'")]
    NotDeleted { file_id: FileId, branch: BranchName },

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Promote(#[from] PromoteError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ProjectLock(#[from] ProjectLockError),

    #[error(transparent)]
    Txn(#[from] TxnError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
