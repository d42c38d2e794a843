//! engine::locking
//!
//! Locks and labels on a project's archives.

use crate::archive::{Label, LockRecord};
use crate::core::types::{BranchName, FileId, RevisionId, UserName};
use crate::locks::{self, LockOutcome, UnlockOutcome};
use crate::tree;
use crate::txn::{Notification, RequestContext};

use super::files::{ensure_visible, ensure_writable};
use super::{EngineError, Project};

impl Project {
    /// Lock `revision` (default: the branch's default revision) for the
    /// caller.
    ///
    /// A lock held by someone else is [`LockOutcome::Conflict`], not an
    /// error.
    pub fn lock(
        &self,
        ctx: &RequestContext,
        id: FileId,
        branch: &BranchName,
        revision: Option<RevisionId>,
    ) -> Result<LockOutcome, EngineError> {
        let (revision, outcome) = self.mutate_archive(id, |archive, graph| {
            ensure_visible(archive, graph, branch)?;
            ensure_writable(graph, branch)?;
            let revision =
                revision.unwrap_or_else(|| tree::resolve_default_revision(archive, graph, branch));
            let outcome = locks::lock(archive, &revision, &ctx.user, branch)?;
            Ok((revision, outcome))
        })?;

        match &outcome {
            LockOutcome::Granted => {
                tracing::info!(file_id = %id, %revision, user = %ctx.user, "locked");
                self.notify(
                    ctx,
                    Notification::Locked {
                        file_id: id,
                        revision,
                        holder: ctx.user.clone(),
                    },
                );
            }
            LockOutcome::AlreadyHeld => {
                tracing::debug!(file_id = %id, %revision, "lock already held");
            }
            LockOutcome::Conflict { held_by } => {
                tracing::info!(file_id = %id, %revision, %held_by, "lock refused");
            }
        }
        Ok(outcome)
    }

    /// Lock several archives, one result per item.
    ///
    /// Items are independent: a failure is reported in its slot and the
    /// batch continues.
    pub fn lock_batch(
        &self,
        ctx: &RequestContext,
        branch: &BranchName,
        items: &[(FileId, Option<RevisionId>)],
    ) -> Vec<(FileId, Result<LockOutcome, EngineError>)> {
        items
            .iter()
            .map(|(id, revision)| {
                let result = self.lock(ctx, *id, branch, revision.clone());
                if let Err(e) = &result {
                    tracing::warn!(file_id = %id, error = %e, "lock failed");
                }
                (*id, result)
            })
            .collect()
    }

    /// Release the caller's lock.
    ///
    /// The workfile action in the outcome follows the configured unlock
    /// behavior; nothing is done to working copies here.
    pub fn unlock(
        &self,
        ctx: &RequestContext,
        id: FileId,
        branch: &BranchName,
        revision: Option<RevisionId>,
    ) -> Result<UnlockOutcome, EngineError> {
        let behavior = self.config().unlock_behavior();
        let outcome = self.mutate_archive(id, |archive, graph| {
            graph.require(branch)?;
            let revision =
                revision.unwrap_or_else(|| tree::resolve_default_revision(archive, graph, branch));
            Ok(locks::unlock(archive, &revision, &ctx.user, behavior)?)
        })?;

        tracing::info!(file_id = %id, revision = %outcome.released.revision, user = %ctx.user, "unlocked");
        self.notify(
            ctx,
            Notification::Unlocked {
                file_id: id,
                revision: outcome.released.revision.clone(),
            },
        );
        Ok(outcome)
    }

    /// Clear a lock whoever holds it.
    ///
    /// Without `revision`, clears the lock on the lowest locked revision.
    pub fn break_lock(
        &self,
        ctx: &RequestContext,
        id: FileId,
        revision: Option<&RevisionId>,
    ) -> Result<LockRecord, EngineError> {
        let record = self.mutate_archive(id, |archive, _| Ok(locks::break_lock(archive, revision)?))?;

        tracing::warn!(
            file_id = %id,
            revision = %record.revision,
            holder = %record.holder,
            broken_by = %ctx.user,
            "lock broken"
        );
        self.notify(
            ctx,
            Notification::Unlocked {
                file_id: id,
                revision: record.revision.clone(),
            },
        );
        Ok(record)
    }

    /// Every lock `user` holds, across archives.
    pub fn locks_held_by(&self, user: &UserName) -> Vec<(FileId, LockRecord)> {
        self.locks.locks_held_by(user)
    }

    /// Every lock on one archive.
    pub fn locks_on(&self, id: FileId) -> Vec<LockRecord> {
        self.locks.locks_for(&id)
    }

    /// Bind `name` to `revision` (default: the branch's default revision).
    #[allow(clippy::too_many_arguments)]
    pub fn label(
        &self,
        ctx: &RequestContext,
        id: FileId,
        branch: &BranchName,
        name: &str,
        revision: Option<RevisionId>,
        floating: bool,
        reuse: bool,
    ) -> Result<RevisionId, EngineError> {
        let revision = self.mutate_archive(id, |archive, graph| {
            let revision = match revision {
                Some(revision) => revision,
                None => {
                    ensure_visible(archive, graph, branch)?;
                    tree::resolve_default_revision(archive, graph, branch)
                }
            };
            tree::apply_label(archive, &revision, name, floating, reuse, &ctx.user)?;
            Ok(revision)
        })?;

        tracing::info!(file_id = %id, label = name, %revision, floating, "labeled");
        self.notify(
            ctx,
            Notification::Labeled {
                file_id: id,
                label: name.to_string(),
                revision: revision.clone(),
            },
        );
        Ok(revision)
    }

    /// Bind `new_name` to the revision `existing` marks.
    pub fn duplicate_label(
        &self,
        ctx: &RequestContext,
        id: FileId,
        existing: &str,
        new_name: &str,
        reuse: bool,
    ) -> Result<RevisionId, EngineError> {
        let revision = self.mutate_archive(id, |archive, _| {
            Ok(tree::duplicate_label(archive, existing, new_name, reuse, &ctx.user)?)
        })?;
        self.notify(
            ctx,
            Notification::Labeled {
                file_id: id,
                label: new_name.to_string(),
                revision: revision.clone(),
            },
        );
        Ok(revision)
    }

    /// Remove a label.
    pub fn unlabel(
        &self,
        ctx: &RequestContext,
        id: FileId,
        name: &str,
    ) -> Result<Label, EngineError> {
        let removed = self.mutate_archive(id, |archive, _| Ok(tree::remove_label(archive, name)?))?;
        tracing::info!(file_id = %id, label = name, "label removed");
        self.notify(
            ctx,
            Notification::Unlabeled {
                file_id: id,
                label: name.to_string(),
            },
        );
        Ok(removed)
    }
}
