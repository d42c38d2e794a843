//! rename and move commands

use anyhow::Result;

use super::common::{self, Session};
use crate::engine::Context;
use crate::ui::output;

/// Rename a file on `branch`.
pub fn rename(ctx: &Context, location: &str, new_name: &str, branch: &str) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    let location = common::location(location)?;
    let id = session.locate(&branch, &location)?;

    let to = session.project.rename(&session.request, id, &branch, new_name)?;
    output::success(
        format!("Renamed {} to {} on '{branch}'", output::quoted(&location), output::quoted(&to)),
        session.verbosity,
    );
    Ok(())
}

/// Move a file to `new_dir` on `branch`.
pub fn move_file(ctx: &Context, location: &str, new_dir: &str, branch: &str) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    let location = common::location(location)?;
    let id = session.locate(&branch, &location)?;

    let to = session.project.move_file(&session.request, id, &branch, new_dir)?;
    output::success(
        format!("Moved {} to {} on '{branch}'", output::quoted(&location), output::quoted(&to)),
        session.verbosity,
    );
    Ok(())
}
