//! get command - Fetch a revision's content

use std::io::Write;
use std::path::Path;

use anyhow::{Context as _, Result};

use super::common::{self, Session};
use crate::core::ops::durable;
use crate::engine::{Context, RevisionSelector};
use crate::ui::output;

/// Write a revision to stdout or `output_path`.
pub fn get(
    ctx: &Context,
    location: &str,
    branch: &str,
    revision: Option<&str>,
    label: Option<&str>,
    output_path: Option<&Path>,
    raw: bool,
) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    let location = common::location(location)?;
    let id = session.locate(&branch, &location)?;

    let selector = match (common::revision(revision)?, label) {
        (Some(revision), _) => RevisionSelector::Revision(revision),
        (None, Some(label)) => RevisionSelector::Label(label.to_string()),
        (None, None) => RevisionSelector::Default,
    };
    let (revision, content) = if raw {
        session.project.fetch(id, &branch, &selector)?
    } else {
        session.project.fetch_workfile(id, &branch, &selector)?
    };

    match output_path {
        Some(path) => {
            durable::write_atomic(path, &content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            output::success(
                format!("Wrote {} revision {revision} to {}", output::quoted(&location), path.display()),
                session.verbosity,
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&content)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
