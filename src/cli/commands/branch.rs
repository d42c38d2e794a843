//! branch command - Create and list branches

use anyhow::Result;

use super::common::{self, Session};
use crate::core::graph::BranchKind;
use crate::engine::Context;
use crate::ui::output;

/// Create `name` under `parent`.
pub fn create(ctx: &Context, name: &str, parent: &str, read_only: bool) -> Result<()> {
    let session = Session::open(ctx)?;
    let name = common::branch(name)?;
    let parent = common::branch(parent)?;
    let kind = if read_only {
        BranchKind::ReadOnly
    } else {
        BranchKind::Feature
    };
    session
        .project
        .create_branch_of_kind(&session.request, name.clone(), parent.clone(), kind)?;
    output::success(
        format!("Created {kind} branch '{name}' from '{parent}'"),
        session.verbosity,
    );
    Ok(())
}

/// Print the branch tree, parents before children.
pub fn list(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    for (branch, parent, depth) in session.project.branch_tree() {
        let read_only = session.project.branch_kind(&branch)? == BranchKind::ReadOnly;
        output::print(
            output::format_branch(&branch, parent.as_ref(), depth, read_only),
            session.verbosity,
        );
    }
    Ok(())
}
