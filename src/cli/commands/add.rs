//! add command - Put a file under version control

use std::path::Path;

use anyhow::Result;

use super::common::{self, Session};
use crate::archive::Attributes;
use crate::engine::Context;
use crate::ui::output;

/// Create an archive from a working file.
#[allow(clippy::too_many_arguments)]
pub fn add(
    ctx: &Context,
    location: &str,
    from: Option<&Path>,
    workdir: Option<&Path>,
    branch: &str,
    message: &str,
    binary: bool,
    keywords: bool,
    require_lock: bool,
) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    let location = common::location(location)?;
    let content = common::read_content(from, workdir, &location)?;

    let attributes = Attributes {
        binary,
        expand_keywords: keywords,
        require_lock: require_lock || session.project.config().require_lock(),
        ..Attributes::default()
    };
    let id = session.project.create_archive(
        &session.request,
        &branch,
        location.clone(),
        content,
        message,
        Some(attributes),
    )?;

    output::success(format!("Added {} on '{branch}' as 1.1", output::quoted(&location)), session.verbosity);
    output::debug(format!("file id {id}"), session.verbosity);
    Ok(())
}
