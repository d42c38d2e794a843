//! locks
//!
//! Per-revision exclusive locks.
//!
//! # Architecture
//!
//! Lock records are authoritative in the archive header and become durable
//! with the archive's next commit. [`LockRegistry`] is an in-memory index
//! over every archive's records, rebuilt from headers when a project opens,
//! so cross-archive queries ("what does this user hold") need not touch
//! archives.
//!
//! Expected outcomes are values, not errors: a lock held by someone else is
//! [`LockOutcome::Conflict`].
//!
//! # Invariants
//!
//! - At most one lock per revision
//! - No lock can be taken on an archive at a reserved location (cemetery or
//!   branch-archive directory)

pub mod registry;

pub use registry::LockRegistry;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::archive::{Archive, LockRecord};
use crate::core::types::{ArchiveLocation, BranchName, FileId, RevisionId, UserName, UtcTimestamp};

/// Errors from lock operations.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("archive {file_id} at {location} is in a reserved directory and cannot be locked")]
    ReservedLocation {
        file_id: FileId,
        location: ArchiveLocation,
    },

    #[error("revision {revision} not found in archive {file_id}")]
    RevisionNotFound {
        file_id: FileId,
        revision: RevisionId,
    },

    #[error("revision {revision} of archive {file_id} is not locked")]
    NotLocked {
        file_id: FileId,
        revision: RevisionId,
    },

    #[error("archive {file_id} has no locks")]
    NoLocks { file_id: FileId },

    #[error("revision {revision} of archive {file_id} is locked by {held_by}")]
    NotHolder {
        file_id: FileId,
        revision: RevisionId,
        held_by: UserName,
    },
}

/// Result of a lock request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome {
    Granted,
    /// The requester already holds this lock; nothing changed.
    AlreadyHeld,
    Conflict { held_by: UserName },
}

/// What the caller should do with the working copy after unlocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockBehavior {
    #[default]
    JustUnlock,
    UnlockAndRestoreTimestamp,
    UnlockAndDeleteWorkfile,
}

/// Working-copy action reported by an unlock. The core never performs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkfileAction {
    Keep,
    RestoreTimestamp,
    Delete,
}

impl From<UnlockBehavior> for WorkfileAction {
    fn from(behavior: UnlockBehavior) -> Self {
        match behavior {
            UnlockBehavior::JustUnlock => WorkfileAction::Keep,
            UnlockBehavior::UnlockAndRestoreTimestamp => WorkfileAction::RestoreTimestamp,
            UnlockBehavior::UnlockAndDeleteWorkfile => WorkfileAction::Delete,
        }
    }
}

/// Result of a successful unlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockOutcome {
    pub released: LockRecord,
    pub workfile: WorkfileAction,
}

/// Something that carries lock records.
pub trait Lockable {
    fn lockable_id(&self) -> FileId;
    /// Where locks would be taken; reserved locations refuse locks.
    fn lock_location(&self) -> &ArchiveLocation;
    fn has_revision(&self, revision: &RevisionId) -> bool;
    fn lock_records(&self) -> &[LockRecord];
    fn lock_records_mut(&mut self) -> &mut Vec<LockRecord>;
}

impl Lockable for Archive {
    fn lockable_id(&self) -> FileId {
        self.file_id()
    }

    fn lock_location(&self) -> &ArchiveLocation {
        &self.header().home
    }

    fn has_revision(&self, revision: &RevisionId) -> bool {
        self.contains(revision)
    }

    fn lock_records(&self) -> &[LockRecord] {
        &self.header().locks
    }

    fn lock_records_mut(&mut self) -> &mut Vec<LockRecord> {
        &mut self.header_mut().locks
    }
}

/// Lock `revision` for `holder`.
pub fn lock<L: Lockable>(
    target: &mut L,
    revision: &RevisionId,
    holder: &UserName,
    branch: &BranchName,
) -> Result<LockOutcome, LockError> {
    if target.lock_location().is_reserved() {
        return Err(LockError::ReservedLocation {
            file_id: target.lockable_id(),
            location: target.lock_location().clone(),
        });
    }
    if !target.has_revision(revision) {
        return Err(LockError::RevisionNotFound {
            file_id: target.lockable_id(),
            revision: revision.clone(),
        });
    }

    if let Some(existing) = holder_of(target, revision) {
        return Ok(if existing == holder {
            LockOutcome::AlreadyHeld
        } else {
            LockOutcome::Conflict {
                held_by: existing.clone(),
            }
        });
    }

    target.lock_records_mut().push(LockRecord {
        revision: revision.clone(),
        holder: holder.clone(),
        branch: branch.clone(),
        locked_at: UtcTimestamp::now(),
    });
    Ok(LockOutcome::Granted)
}

/// Release `holder`'s lock on `revision`.
pub fn unlock<L: Lockable>(
    target: &mut L,
    revision: &RevisionId,
    holder: &UserName,
    behavior: UnlockBehavior,
) -> Result<UnlockOutcome, LockError> {
    let position = lock_position(target, revision)?;
    let held_by = &target.lock_records()[position].holder;
    if held_by != holder {
        return Err(LockError::NotHolder {
            file_id: target.lockable_id(),
            revision: revision.clone(),
            held_by: held_by.clone(),
        });
    }
    let released = target.lock_records_mut().remove(position);
    Ok(UnlockOutcome {
        released,
        workfile: behavior.into(),
    })
}

/// Forcibly clear one lock regardless of holder.
///
/// Clears the lock on `revision` when given, otherwise the lock on the
/// lowest locked revision.
pub fn break_lock<L: Lockable>(
    target: &mut L,
    revision: Option<&RevisionId>,
) -> Result<LockRecord, LockError> {
    let position = match revision {
        Some(rev) => lock_position(target, rev)?,
        None => target
            .lock_records()
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.revision.cmp(&b.1.revision))
            .map(|(i, _)| i)
            .ok_or(LockError::NoLocks {
                file_id: target.lockable_id(),
            })?,
    };
    Ok(target.lock_records_mut().remove(position))
}

fn lock_position<L: Lockable>(target: &L, revision: &RevisionId) -> Result<usize, LockError> {
    target
        .lock_records()
        .iter()
        .position(|l| &l.revision == revision)
        .ok_or_else(|| LockError::NotLocked {
            file_id: target.lockable_id(),
            revision: revision.clone(),
        })
}

/// Who holds the lock on `revision`.
pub fn holder_of<'a, L: Lockable>(target: &'a L, revision: &RevisionId) -> Option<&'a UserName> {
    target
        .lock_records()
        .iter()
        .find(|l| &l.revision == revision)
        .map(|l| &l.holder)
}

/// Whether any revision is locked.
pub fn is_locked<L: Lockable>(target: &L) -> bool {
    !target.lock_records().is_empty()
}
