//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Project root (default: configured project, then the
//!   current directory)
//! - `--user <name>`: Act as this user
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// branchvault - multi-user version control with branch promotion
#[derive(Parser, Debug)]
#[command(name = "bv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project root to operate on
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Act as this user (overrides the configured user)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a project
    #[command(
        name = "init",
        long_about = "Create a project at the project root.\n\n\
            Lays out the archive, cemetery and branch files and optionally writes \
            project settings to config.toml. Running it on an existing project only \
            rewrites the settings given.",
        after_help = "\
EXAMPLES:
    # New project in the current directory
    bv init

    # Require locks for checkin and store revisions uncompressed
    bv --cwd /srv/vault/web init --require-lock --compression none"
    )]
    Init {
        /// New archives require a lock for checkin
        #[arg(long)]
        require_lock: bool,

        /// Compression for stored revisions
        #[arg(long, value_enum)]
        compression: Option<CompressionArg>,

        /// Suffix for promoted files that collide with working files
        #[arg(long)]
        promoted_suffix: Option<String>,
    },

    /// Create or list branches
    #[command(name = "branch")]
    Branch {
        #[command(subcommand)]
        action: BranchAction,
    },

    /// Put a file under version control
    #[command(
        name = "add",
        after_help = "\
EXAMPLES:
    # Add src/main.c from the working directory on trunk
    bv add src/main.c -m \"initial import\"

    # Add a file that only exists on a feature branch
    bv add docs/notes.md --from ./notes.md -b feature"
    )]
    Add {
        /// Project-relative location, e.g. src/main.c
        location: String,

        /// Read content from this file (default: the location under --workdir)
        #[arg(long)]
        from: Option<PathBuf>,

        /// Working directory holding the file
        #[arg(long)]
        workdir: Option<PathBuf>,

        /// Branch to create the file on
        #[arg(short, long, default_value = "trunk")]
        branch: String,

        /// Revision description
        #[arg(short, long, default_value = "")]
        message: String,

        /// Treat content as binary (never line-merged)
        #[arg(long)]
        binary: bool,

        /// Expand $Revision$-style keywords in working copies
        #[arg(long, conflicts_with = "binary")]
        keywords: bool,

        /// Require a lock for checkin
        #[arg(long)]
        require_lock: bool,
    },

    /// Store a new revision
    #[command(name = "checkin", visible_alias = "ci")]
    Checkin {
        /// Project-relative location
        location: String,

        /// Read content from this file (default: the location under --workdir)
        #[arg(long)]
        from: Option<PathBuf>,

        /// Working directory holding the file
        #[arg(long)]
        workdir: Option<PathBuf>,

        #[arg(short, long, default_value = "trunk")]
        branch: String,

        /// Revision description
        #[arg(short, long, default_value = "")]
        message: String,
    },

    /// Print or write a revision's content
    #[command(
        name = "get",
        after_help = "\
EXAMPLES:
    # Default revision on trunk to stdout
    bv get src/main.c

    # A labeled revision into a file
    bv get src/main.c -l release-1 -o main.c"
    )]
    Get {
        location: String,

        #[arg(short, long, default_value = "trunk")]
        branch: String,

        /// Revision id, e.g. 1.2.1.1
        #[arg(short, long, conflicts_with = "label")]
        revision: Option<String>,

        /// Label name
        #[arg(short, long)]
        label: Option<String>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stored text, without keyword expansion
        #[arg(long)]
        raw: bool,
    },

    /// List controlled files on a branch
    #[command(name = "ls")]
    List {
        #[arg(short, long, default_value = "trunk")]
        branch: String,
    },

    /// Show a file's revision history
    #[command(name = "log")]
    Log {
        location: String,

        #[arg(short, long, default_value = "trunk")]
        branch: String,
    },

    /// Lock the default (or given) revision of one or more files
    #[command(name = "lock")]
    Lock {
        #[arg(required = true)]
        locations: Vec<String>,

        #[arg(short, long, default_value = "trunk")]
        branch: String,

        /// Revision to lock (single file only)
        #[arg(short, long)]
        revision: Option<String>,
    },

    /// Release your lock
    #[command(name = "unlock")]
    Unlock {
        location: String,

        #[arg(short, long, default_value = "trunk")]
        branch: String,

        #[arg(short, long)]
        revision: Option<String>,
    },

    /// Clear a lock regardless of who holds it
    #[command(name = "break-lock")]
    BreakLock {
        location: String,

        #[arg(short, long, default_value = "trunk")]
        branch: String,

        /// Revision whose lock to clear (default: lowest locked revision)
        #[arg(short, long)]
        revision: Option<String>,
    },

    /// List locks held by a user
    #[command(name = "locks")]
    Locks {
        /// Whose locks (default: you)
        #[arg(long = "holder")]
        holder: Option<String>,
    },

    /// Attach a label to a revision
    #[command(name = "label")]
    Label {
        location: String,

        /// Label name
        name: String,

        #[arg(short, long, default_value = "trunk")]
        branch: String,

        #[arg(short, long)]
        revision: Option<String>,

        /// The label follows the tip of its lineage
        #[arg(long)]
        floating: bool,

        /// Move an existing label of the same name
        #[arg(long)]
        reuse: bool,
    },

    /// Remove a label
    #[command(name = "unlabel")]
    Unlabel {
        location: String,

        name: String,

        #[arg(short, long, default_value = "trunk")]
        branch: String,
    },

    /// Rename a file on a branch
    #[command(name = "rename")]
    Rename {
        location: String,

        /// New short name
        new_name: String,

        #[arg(short, long, default_value = "trunk")]
        branch: String,
    },

    /// Move a file to another directory on a branch
    #[command(name = "move", visible_alias = "mv")]
    Move {
        location: String,

        /// New directory, relative to the project root ("" for the root)
        new_dir: String,

        #[arg(short, long, default_value = "trunk")]
        branch: String,
    },

    /// Delete a file on a branch
    #[command(name = "delete", visible_alias = "rm")]
    Delete {
        location: String,

        #[arg(short, long, default_value = "trunk")]
        branch: String,
    },

    /// Restore a deleted file
    #[command(name = "undelete")]
    Undelete {
        /// Location the file had when it was deleted
        location: String,

        #[arg(short, long, default_value = "trunk")]
        branch: String,
    },

    /// List files with changes waiting to be promoted
    #[command(name = "candidates")]
    Candidates {
        /// Branch to promote from
        #[arg(short, long)]
        branch: String,
    },

    /// Promote changes from a branch into its parent
    #[command(
        name = "promote",
        long_about = "Promote pending changes from a branch into its parent branch.\n\n\
            Content changes are merged three ways against the common ancestor. A clean \
            merge is stored as the parent's next revision with --checkin; otherwise it is \
            written to the parent's working file under --workdir, or under the current \
            directory. Overlapping edits are written next to the parent's working \
            file as <name>.ancestor, <name>.parent and <name>.child for manual \
            resolution.",
        after_help = "\
EXAMPLES:
    # Promote everything pending on feature, storing clean merges
    bv promote -b feature --checkin --workdir ../trunk-work

    # Promote a single file, writing the merge to ./src/main.c
    bv promote -b feature src/main.c"
    )]
    Promote {
        /// Branch to promote from
        #[arg(short, long)]
        branch: String,

        /// Only these locations (default: every candidate)
        locations: Vec<String>,

        /// The parent branch's working directory
        #[arg(long)]
        workdir: Option<PathBuf>,

        /// Check in clean merges on the parent
        #[arg(long)]
        checkin: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    bv completion bash > ~/.local/share/bash-completion/completions/bv

    # Zsh
    bv completion zsh > ~/.zfunc/_bv"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Branch subcommands.
#[derive(Subcommand, Debug)]
pub enum BranchAction {
    /// Create a branch under a parent
    Create {
        name: String,

        #[arg(short, long, default_value = "trunk")]
        parent: String,

        /// Refuse checkins, locks and promotions into the branch
        #[arg(long)]
        read_only: bool,
    },
    /// List branches with their parents
    List,
}

/// Compression choices for `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompressionArg {
    None,
    Lz4,
}

/// Shells for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
