//! cli::commands
//!
//! Command implementations.
//!
//! # Architecture
//!
//! Each command is implemented in its own module. Commands open the project
//! through [`common::Session`], call engine operations, and print results.
//! They own all working-file I/O: reading files to check in, writing
//! fetched content, merged results and conflict buffers.

mod add;
mod branch;
mod checkin;
mod common;
mod completion;
mod delete;
mod get;
mod init;
mod label;
mod list;
mod lock;
mod log_cmd;
mod promote;
mod rename;

// Re-export command functions for testing and direct invocation
pub use add::add;
pub use checkin::checkin;
pub use completion::completion;
pub use delete::{delete, undelete};
pub use get::get;
pub use init::init;
pub use label::{label, unlabel};
pub use list::list;
pub use lock::{break_lock, lock, locks, unlock};
pub use log_cmd::log;
pub use promote::{candidates, promote};
pub use rename::{move_file, rename};

use crate::cli::args::{BranchAction, Command};
use crate::engine::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init {
            require_lock,
            compression,
            promoted_suffix,
        } => init::init(ctx, require_lock, compression, promoted_suffix),
        Command::Branch { action } => match action {
            BranchAction::Create {
                name,
                parent,
                read_only,
            } => branch::create(ctx, &name, &parent, read_only),
            BranchAction::List => branch::list(ctx),
        },

        // Files
        Command::Add {
            location,
            from,
            workdir,
            branch,
            message,
            binary,
            keywords,
            require_lock,
        } => add::add(
            ctx,
            &location,
            from.as_deref(),
            workdir.as_deref(),
            &branch,
            &message,
            binary,
            keywords,
            require_lock,
        ),
        Command::Checkin {
            location,
            from,
            workdir,
            branch,
            message,
        } => checkin::checkin(
            ctx,
            &location,
            from.as_deref(),
            workdir.as_deref(),
            &branch,
            &message,
        ),
        Command::Get {
            location,
            branch,
            revision,
            label,
            output,
            raw,
        } => get::get(
            ctx,
            &location,
            &branch,
            revision.as_deref(),
            label.as_deref(),
            output.as_deref(),
            raw,
        ),
        Command::List { branch } => list::list(ctx, &branch),
        Command::Log { location, branch } => log_cmd::log(ctx, &location, &branch),
        Command::Rename {
            location,
            new_name,
            branch,
        } => rename::rename(ctx, &location, &new_name, &branch),
        Command::Move {
            location,
            new_dir,
            branch,
        } => rename::move_file(ctx, &location, &new_dir, &branch),
        Command::Delete { location, branch } => delete::delete(ctx, &location, &branch),
        Command::Undelete { location, branch } => delete::undelete(ctx, &location, &branch),

        // Locks and labels
        Command::Lock {
            locations,
            branch,
            revision,
        } => lock::lock(ctx, &locations, &branch, revision.as_deref()),
        Command::Unlock {
            location,
            branch,
            revision,
        } => lock::unlock(ctx, &location, &branch, revision.as_deref()),
        Command::BreakLock {
            location,
            branch,
            revision,
        } => lock::break_lock(ctx, &location, &branch, revision.as_deref()),
        Command::Locks { holder } => lock::locks(ctx, holder.as_deref()),
        Command::Label {
            location,
            name,
            branch,
            revision,
            floating,
            reuse,
        } => label::label(ctx, &location, &name, &branch, revision.as_deref(), floating, reuse),
        Command::Unlabel {
            location,
            name,
            branch,
        } => label::unlabel(ctx, &location, &name, &branch),

        // Promotion
        Command::Candidates { branch } => promote::candidates(ctx, &branch),
        Command::Promote {
            branch,
            locations,
            workdir,
            checkin,
        } => promote::promote(ctx, &branch, &locations, workdir.as_deref(), checkin),

        Command::Completion { shell } => completion::completion(shell),
    }
}
