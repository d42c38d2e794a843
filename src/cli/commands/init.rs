//! init command - Create a project

use anyhow::{Context as _, Result};

use super::common;
use crate::cli::args::CompressionArg;
use crate::codec::CompressionKind;
use crate::core::config::ProjectConfig;
use crate::core::paths::ProjectPaths;
use crate::engine::{Context, Project};
use crate::ui::output;

/// Create the project layout, writing settings when any were given.
pub fn init(
    ctx: &Context,
    require_lock: bool,
    compression: Option<CompressionArg>,
    promoted_suffix: Option<String>,
) -> Result<()> {
    let root = common::project_root(ctx)?;
    let verbosity = common::verbosity(ctx);

    let settings = (require_lock || compression.is_some() || promoted_suffix.is_some()).then(|| {
        ProjectConfig {
            compression: compression.map(|c| match c {
                CompressionArg::None => CompressionKind::None,
                CompressionArg::Lz4 => CompressionKind::Lz4,
            }),
            unlock_behavior: None,
            require_lock: require_lock.then_some(true),
            promoted_suffix,
        }
    });

    let already = ProjectPaths::new(root.clone()).is_initialized();
    let project = Project::init(&root, settings.as_ref())
        .with_context(|| format!("Failed to initialize project at {}", root.display()))?;

    if already {
        output::print(
            format!("Project at {} already exists.", project.paths().root().display()),
            verbosity,
        );
    } else {
        output::success(
            format!("Initialized project at {}", project.paths().root().display()),
            verbosity,
        );
    }
    Ok(())
}
