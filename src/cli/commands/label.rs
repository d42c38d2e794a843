//! label and unlabel commands

use anyhow::Result;

use super::common::{self, Session};
use crate::engine::Context;
use crate::ui::output;

/// Attach `name` to a revision.
pub fn label(
    ctx: &Context,
    location: &str,
    name: &str,
    branch: &str,
    revision: Option<&str>,
    floating: bool,
    reuse: bool,
) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    let location = common::location(location)?;
    let id = session.locate(&branch, &location)?;

    let revision = session.project.label(
        &session.request,
        id,
        &branch,
        name,
        common::revision(revision)?,
        floating,
        reuse,
    )?;
    let kind = if floating { "floating label" } else { "label" };
    output::success(
        format!("Applied {kind} '{name}' to {} revision {revision}", output::quoted(&location)),
        session.verbosity,
    );
    Ok(())
}

/// Remove a label.
pub fn unlabel(ctx: &Context, location: &str, name: &str, branch: &str) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    let location = common::location(location)?;
    let id = session.locate(&branch, &location)?;

    let removed = session.project.unlabel(&session.request, id, name)?;
    output::success(
        format!("Removed label '{}' from revision {}", removed.name, removed.revision),
        session.verbosity,
    );
    Ok(())
}
