//! log command - Show a file's revision history

use anyhow::Result;

use super::common::{self, Session};
use crate::engine::Context;
use crate::ui::output;

/// Print every revision of the file at `location` on `branch`.
pub fn log(ctx: &Context, location: &str, branch: &str) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    let location = common::location(location)?;
    let id = session.locate(&branch, &location)?;

    for summary in session.project.history(id)? {
        output::print(output::format_revision(&summary), session.verbosity);
    }
    Ok(())
}
