//! lock, unlock, break-lock and locks commands

use anyhow::{bail, Result};

use super::common::{self, Session};
use crate::core::types::UserName;
use crate::engine::Context;
use crate::locks::{LockOutcome, WorkfileAction};
use crate::ui::output;

/// Lock one or more files. Each file succeeds or fails on its own.
pub fn lock(ctx: &Context, locations: &[String], branch: &str, revision: Option<&str>) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    let revision = common::revision(revision)?;
    if revision.is_some() && locations.len() > 1 {
        bail!("--revision applies to a single file");
    }

    let mut items = Vec::with_capacity(locations.len());
    for path in locations {
        let location = common::location(path)?;
        items.push((session.locate(&branch, &location)?, revision.clone(), location));
    }
    let requests: Vec<_> = items.iter().map(|(id, rev, _)| (*id, rev.clone())).collect();
    let results = session.project.lock_batch(&session.request, &branch, &requests);

    let mut failed = 0;
    for ((_, result), (_, _, location)) in results.into_iter().zip(&items) {
        match result {
            Ok(LockOutcome::Granted) => {
                output::success(format!("Locked {}", output::quoted(location)), session.verbosity)
            }
            Ok(LockOutcome::AlreadyHeld) => output::print(
                format!("{} is already locked by you", output::quoted(location)),
                session.verbosity,
            ),
            Ok(LockOutcome::Conflict { held_by }) => {
                failed += 1;
                output::warn(
                    format!("{} is locked by {held_by}", output::quoted(location)),
                    session.verbosity,
                );
            }
            Err(e) => {
                failed += 1;
                output::error(format!("{}: {e}", output::quoted(location)));
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} lock requests failed", items.len());
    }
    Ok(())
}

/// Release the caller's lock.
pub fn unlock(ctx: &Context, location: &str, branch: &str, revision: Option<&str>) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    let location = common::location(location)?;
    let id = session.locate(&branch, &location)?;

    let outcome = session
        .project
        .unlock(&session.request, id, &branch, common::revision(revision)?)?;
    output::success(
        format!("Unlocked {} revision {}", output::quoted(&location), outcome.released.revision),
        session.verbosity,
    );
    match outcome.workfile {
        WorkfileAction::Keep => {}
        WorkfileAction::RestoreTimestamp => {
            output::print("Restore the working file's timestamp to discard local edits.", session.verbosity)
        }
        WorkfileAction::Delete => {
            output::print("The working file may be deleted.", session.verbosity)
        }
    }
    Ok(())
}

/// Clear a lock regardless of holder.
pub fn break_lock(ctx: &Context, location: &str, branch: &str, revision: Option<&str>) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    let location = common::location(location)?;
    let id = session.locate(&branch, &location)?;

    let revision = common::revision(revision)?;
    let record = session
        .project
        .break_lock(&session.request, id, revision.as_ref())?;
    output::success(
        format!(
            "Broke {}'s lock on {} revision {}",
            record.holder,
            output::quoted(&location),
            record.revision
        ),
        session.verbosity,
    );
    Ok(())
}

/// List locks held by `holder` (default: the caller).
pub fn locks(ctx: &Context, holder: Option<&str>) -> Result<()> {
    let session = Session::open(ctx)?;
    let holder = match holder {
        Some(name) => UserName::new(name)?,
        None => session.request.user.clone(),
    };
    for (id, record) in session.project.locks_held_by(&holder) {
        let archive = session.project.archive(id)?;
        output::print(
            format!(
                "{}  {}  on '{}'",
                archive.header().home,
                record.revision,
                record.branch
            ),
            session.verbosity,
        );
    }
    Ok(())
}
