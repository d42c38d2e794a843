//! delete and undelete commands

use anyhow::{anyhow, Result};

use super::common::{self, Session};
use crate::engine::Context;
use crate::ui::output;

/// Delete a file on `branch`.
pub fn delete(ctx: &Context, location: &str, branch: &str) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    let location = common::location(location)?;
    let id = session.locate(&branch, &location)?;

    session.project.delete(&session.request, id, &branch)?;
    output::success(format!("Deleted {} on '{branch}'", output::quoted(&location)), session.verbosity);
    Ok(())
}

/// Restore a file deleted on `branch`.
pub fn undelete(ctx: &Context, location: &str, branch: &str) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    let location = common::location(location)?;
    let id = session
        .project
        .find_deleted(&branch, &location)
        .ok_or_else(|| anyhow!("no file deleted at '{location}' on '{branch}'"))?;

    let restored = session.project.undelete(&session.request, id, &branch)?;
    output::success(format!("Restored {} on '{branch}'", output::quoted(&restored)), session.verbosity);
    Ok(())
}
