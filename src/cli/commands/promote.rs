//! candidates and promote commands
//!
//! The engine returns merged and conflicting content as buffers; this
//! module is where they reach the parent branch's working directory.

use std::path::Path;
use std::sync::atomic::AtomicBool;

use anyhow::{bail, Context as _, Result};

use super::common::{self, Session};
use crate::core::ops::durable;
use crate::core::types::{ArchiveLocation, BranchName};
use crate::engine::Context;
use crate::promote::{DirWorkArea, NoWorkArea, PromoteOutcome, PromoteResult, WorkArea};
use crate::ui::output;

/// List pending changes on `branch`.
pub fn candidates(ctx: &Context, branch: &str) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    let candidates = session.project.promotion_candidates(&branch)?;
    if candidates.is_empty() {
        output::print(format!("Nothing to promote on '{branch}'"), session.verbosity);
    }
    for info in &candidates {
        output::print(output::format_candidate(info), session.verbosity);
    }
    Ok(())
}

/// Promote pending changes on `branch` into its parent.
pub fn promote(
    ctx: &Context,
    branch: &str,
    locations: &[String],
    workdir: Option<&Path>,
    checkin: bool,
) -> Result<()> {
    let session = Session::open(ctx)?;
    let branch = common::branch(branch)?;
    let Some(target) = session.project.parent_of(&branch)? else {
        bail!("'{branch}' has no parent to promote into");
    };

    let mut pending = session.project.promotion_candidates(&branch)?;
    if !locations.is_empty() {
        let wanted = locations
            .iter()
            .map(|l| common::location(l))
            .collect::<Result<Vec<ArchiveLocation>>>()?;
        for location in &wanted {
            if !pending.iter().any(|c| &c.source_location == location) {
                output::warn(
                    format!("{} has nothing to promote", output::quoted(location)),
                    session.verbosity,
                );
            }
        }
        pending.retain(|c| wanted.contains(&c.source_location));
    }
    if pending.is_empty() {
        output::print(format!("Nothing to promote on '{branch}'"), session.verbosity);
        return Ok(());
    }

    let dir_area = workdir.map(|dir| DirWorkArea::new(dir, target.clone()));
    let work_area: &dyn WorkArea = match &dir_area {
        Some(area) => area,
        None => &NoWorkArea,
    };
    let cancel = AtomicBool::new(false);
    let results = session
        .project
        .promote_batch(&session.request, &pending, work_area, &cancel);

    let mut conflicts = 0;
    let mut failures = 0;
    for (file_id, result) in results {
        let applied = result
            .map_err(anyhow::Error::from)
            .and_then(|result| apply(&session, &branch, &target, workdir, checkin, result));
        match applied {
            Ok(Applied::Done) => {}
            Ok(Applied::Conflict) => conflicts += 1,
            Err(e) => {
                failures += 1;
                output::error(format!("promotion of {file_id} failed: {e:#}"));
            }
        }
    }

    if failures > 0 || conflicts > 0 {
        bail!("{conflicts} conflict(s) and {failures} failure(s) while promoting '{branch}'");
    }
    Ok(())
}

enum Applied {
    Done,
    Conflict,
}

/// Carry one promotion result to the parent's working directory (or the
/// current directory) and, for clean merges with `checkin`, into the archive.
fn apply(
    session: &Session,
    branch: &BranchName,
    target: &BranchName,
    workdir: Option<&Path>,
    checkin: bool,
    result: PromoteResult,
) -> Result<Applied> {
    let file_id = result.file_id;
    if let Some((from, to)) = &result.relocated {
        output::print(
            format!("Relocated {} to {} on '{target}'", output::quoted(from), output::quoted(to)),
            session.verbosity,
        );
    }

    match result.outcome {
        PromoteOutcome::AlreadyPromoted => output::print(
            format!("{file_id} was already promoted"),
            session.verbosity,
        ),
        PromoteOutcome::Merged { content, location, base } => {
            // The child's anchor is already cleared, so the merged buffer
            // must land somewhere before this returns.
            if workdir.is_some() || !checkin {
                let path = common::workfile(workdir, &location);
                write_file(&path, &content)?;
                if !checkin {
                    output::success(
                        format!(
                            "Merged {} onto {base}; wrote {} (not checked in)",
                            output::quoted(&location),
                            path.display()
                        ),
                        session.verbosity,
                    );
                }
            }
            if checkin {
                let revision = session.project.checkin(
                    &session.request,
                    file_id,
                    target,
                    content,
                    &format!("promoted from {branch}"),
                )?;
                output::success(
                    format!("Merged {} into '{target}' as {revision}", output::quoted(&location)),
                    session.verbosity,
                );
            }
        }
        PromoteOutcome::Conflict {
            ancestor,
            parent_tip,
            child_tip,
            ancestor_id,
            parent_id,
            child_id,
            location,
        } => {
            let base = common::workfile(workdir, &location);
            for (suffix, content) in [
                ("ancestor", &ancestor),
                ("parent", &parent_tip),
                ("child", &child_tip),
            ] {
                let mut path = base.clone().into_os_string();
                path.push(format!(".{suffix}"));
                write_file(Path::new(&path), content)?;
            }
            output::warn(
                format!(
                    "{} has overlapping edits (ancestor {ancestor_id}, parent {parent_id}, child {child_id}); \
                     resolve from {}.{{ancestor,parent,child}}",
                    output::quoted(&location),
                    base.display()
                ),
                session.verbosity,
            );
            return Ok(Applied::Conflict);
        }
        PromoteOutcome::Relocated { .. } => {}
        PromoteOutcome::Created {
            location,
            revision,
            content,
            collision,
        } => {
            if let Some(dir) = workdir {
                write_file(&common::workfile(Some(dir), &location), &content)?;
            }
            if let Some(existing) = collision {
                output::warn(
                    format!(
                        "an uncontrolled {} is in the way; created as {}",
                        output::quoted(&existing),
                        output::quoted(&location)
                    ),
                    session.verbosity,
                );
            }
            output::success(
                format!("Created {} on '{target}' at {revision}", output::quoted(&location)),
                session.verbosity,
            );
        }
        PromoteOutcome::Deleted {
            location,
            buried,
            remove_workfile,
        } => {
            if remove_workfile {
                if let Some(dir) = workdir {
                    let path = common::workfile(Some(dir), &location);
                    std::fs::remove_file(&path)
                        .with_context(|| format!("Failed to remove {}", path.display()))?;
                }
            }
            let how = if buried { " (moved to the cemetery)" } else { "" };
            output::success(
                format!("Deleted {} on '{target}'{how}", output::quoted(&location)),
                session.verbosity,
            );
        }
    }
    Ok(Applied::Done)
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    durable::write_atomic(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
