//! Shared plumbing for command handlers.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context as _, Result};

use crate::core::config::Config;
use crate::core::types::{ArchiveLocation, BranchName, FileId, RevisionId, UserName};
use crate::engine::{Context, Project};
use crate::txn::RequestContext;
use crate::ui::output::Verbosity;

/// An open project plus the transaction envelope for one command.
///
/// The envelope closes when the session is dropped.
pub(super) struct Session {
    pub project: Project,
    pub request: RequestContext,
    pub verbosity: Verbosity,
}

impl Session {
    pub fn open(ctx: &Context) -> Result<Self> {
        let root = project_root(ctx)?;
        let project = Project::open(&root)
            .with_context(|| format!("Failed to open project at {}", root.display()))?;
        let user = resolve_user(ctx, project.config())?;
        let request = project.begin(user);
        Ok(Self {
            project,
            request,
            verbosity: verbosity(ctx),
        })
    }

    /// The archive visible at `location` on `branch`.
    pub fn locate(&self, branch: &BranchName, location: &ArchiveLocation) -> Result<FileId> {
        self.project
            .find(branch, location)
            .ok_or_else(|| anyhow!("'{location}' is not a controlled file on '{branch}'"))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.project.end(&self.request);
    }
}

pub(super) fn verbosity(ctx: &Context) -> Verbosity {
    Verbosity::from_flags(ctx.quiet, ctx.debug)
}

/// `--cwd`, else the configured default project, else the current directory.
pub(super) fn project_root(ctx: &Context) -> Result<PathBuf> {
    if let Some(cwd) = &ctx.cwd {
        return Ok(cwd.clone());
    }
    let config = Config::load(None).context("Failed to load configuration")?;
    match config.default_project() {
        Some(root) => Ok(root.to_path_buf()),
        None => std::env::current_dir().context("Failed to read current directory"),
    }
}

/// `--user`, else the configured user, else the login name.
pub(super) fn resolve_user(ctx: &Context, config: &Config) -> Result<UserName> {
    let name = ctx
        .user
        .clone()
        .or_else(|| config.user().map(str::to_string))
        .or_else(|| std::env::var("USER").ok())
        .or_else(|| std::env::var("USERNAME").ok())
        .ok_or_else(|| anyhow!("no user configured; pass --user or set `user` in the global config"))?;
    Ok(UserName::new(name)?)
}

pub(super) fn branch(name: &str) -> Result<BranchName> {
    BranchName::new(name).with_context(|| format!("invalid branch name '{name}'"))
}

pub(super) fn location(path: &str) -> Result<ArchiveLocation> {
    ArchiveLocation::from_relative_path(path).with_context(|| format!("invalid location '{path}'"))
}

pub(super) fn revision(id: Option<&str>) -> Result<Option<RevisionId>> {
    id.map(|r| RevisionId::new(r).with_context(|| format!("invalid revision '{r}'")))
        .transpose()
}

/// Path of `location` inside a working directory.
pub(super) fn workfile(workdir: Option<&Path>, location: &ArchiveLocation) -> PathBuf {
    let mut path = workdir.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    if !location.appended_path().is_empty() {
        path.push(location.appended_path());
    }
    path.push(location.short_name());
    path
}

/// Content for add/checkin: `--from`, else the working file.
pub(super) fn read_content(
    from: Option<&Path>,
    workdir: Option<&Path>,
    location: &ArchiveLocation,
) -> Result<Vec<u8>> {
    let path = match from {
        Some(path) => path.to_path_buf(),
        None => workfile(workdir, location),
    };
    if !path.is_file() {
        bail!("no file at {}", path.display());
    }
    std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))
}
