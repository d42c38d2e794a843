//! ls command - List controlled files

use anyhow::Result;

use super::common::{self, Session};
use crate::engine::Context;
use crate::ui::output;

/// Print every file visible on `branch`.
pub fn list(ctx: &Context, branch: &str) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    for (id, location) in session.project.list(&branch)? {
        let holders = session.project.locks_on(id);
        if holders.is_empty() {
            output::print(location, session.verbosity);
        } else {
            let names: Vec<&str> = holders.iter().map(|l| l.holder.as_str()).collect();
            output::print(format!("{location}  (locked: {})", names.join(", ")), session.verbosity);
        }
    }
    Ok(())
}
