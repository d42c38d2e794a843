//! cli
//!
//! Command-line interface layer for branchvault.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Read and write working files; the engine never touches them
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to a
//! handler per command. Each handler opens the project, wraps its work in
//! one transaction envelope, and reports through [`crate::ui::output`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine;
use anyhow::Result;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
        user: cli.user.clone(),
    };

    commands::dispatch(cli.command, &ctx)
}
