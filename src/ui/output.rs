//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag. Content
//! fetched with `bv get` bypasses this module and goes to stdout verbatim.

use std::fmt::Display;

use crate::core::types::{ArchiveLocation, BranchName};
use crate::promote::FilePromotionInfo;
use crate::tree::RevisionSummary;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a success message (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// One history line: `1.2  ann  2024-05-01 10:00  120 B  [labels]  description`.
pub fn format_revision(summary: &RevisionSummary) -> String {
    let mut line = format!(
        "{:<12} {:<10} {}  {:>8} B",
        summary.id.to_string(),
        summary.author.as_str(),
        summary.timestamp.as_datetime().format("%Y-%m-%d %H:%M"),
        summary.size
    );
    if !summary.labels.is_empty() {
        line.push_str(&format!("  [{}]", summary.labels.join(", ")));
    }
    if !summary.description.is_empty() {
        line.push_str("  ");
        line.push_str(&summary.description);
    }
    line
}

/// One promotion candidate line.
pub fn format_candidate(info: &FilePromotionInfo) -> String {
    match &info.target_location {
        Some(target) if target != &info.source_location => format!(
            "{:<24} {} (was {})",
            info.promotion_type.as_str(),
            info.source_location,
            target
        ),
        _ => format!("{:<24} {}", info.promotion_type.as_str(), info.source_location),
    }
}

/// A branch with its parent, indented by depth.
pub fn format_branch(
    name: &BranchName,
    parent: Option<&BranchName>,
    depth: usize,
    read_only: bool,
) -> String {
    let indent = "  ".repeat(depth);
    let marker = if read_only { " [read-only]" } else { "" };
    match parent {
        Some(parent) => format!("{indent}{name} (from {parent}){marker}"),
        None => format!("{indent}{name}{marker}"),
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `location` quoted for messages.
pub fn quoted(location: &ArchiveLocation) -> String {
    format!("'{location}'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{RevisionId, UserName, UtcTimestamp};

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn revision_line_shows_labels_and_description() {
        let summary = RevisionSummary {
            id: RevisionId::new("1.2").unwrap(),
            author: UserName::new("ann").unwrap(),
            timestamp: UtcTimestamp::now(),
            description: "fix".into(),
            size: 12,
            labels: vec!["rel".into()],
        };
        let line = format_revision(&summary);
        assert!(line.starts_with("1.2"));
        assert!(line.contains("[rel]"));
        assert!(line.ends_with("fix"));
    }

    #[test]
    fn branch_indentation() {
        let trunk = BranchName::trunk();
        let dev = BranchName::new("dev").unwrap();
        assert_eq!(format_branch(&trunk, None, 0, false), "trunk");
        assert_eq!(format_branch(&dev, Some(&trunk), 1, false), "  dev (from trunk)");
        assert_eq!(
            format_branch(&dev, Some(&trunk), 1, true),
            "  dev (from trunk) [read-only]"
        );
    }

    #[test]
    fn format_list_prefixes() {
        assert_eq!(format_list(&["a", "b"], "- "), "- a\n- b");
    }
}
