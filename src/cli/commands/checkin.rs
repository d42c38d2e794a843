//! checkin command - Store a new revision

use std::path::Path;

use anyhow::Result;

use super::common::{self, Session};
use crate::engine::Context;
use crate::ui::output;

/// Check in a working file on `branch`.
pub fn checkin(
    ctx: &Context,
    location: &str,
    from: Option<&Path>,
    workdir: Option<&Path>,
    branch: &str,
    message: &str,
) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    let location = common::location(location)?;
    let id = session.locate(&branch, &location)?;
    let content = common::read_content(from, workdir, &location)?;

    let revision = session
        .project
        .checkin(&session.request, id, &branch, content, message)?;
    output::success(
        format!("Checked in {} as {revision} on '{branch}'", output::quoted(&location)),
        session.verbosity,
    );
    Ok(())
}
