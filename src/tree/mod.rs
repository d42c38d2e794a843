//! tree
//!
//! Branch and label resolution over one archive.
//!
//! # Architecture
//!
//! Revision ids encode the fork structure, so most questions are answered
//! from ids alone. Branch-scoped state lives in the archive's views:
//!
//! - A branch's *default* revision is its own tip, else its parent branch's
//!   default, ending at the trunk lineage tip.
//! - A branch's *location* is the nearest override up the branch chain, else
//!   the archive's home location.
//! - An archive is *visible* on a branch when it was created on that branch
//!   or an ancestor, no branch on the chain marks it deleted, and it is not
//!   in the cemetery.
//!
//! # Invariants
//!
//! - A floating label always resolves to the tip of its lineage
//! - Label names are unique within an archive

use std::cmp::Reverse;

use thiserror::Error;

use crate::archive::{Archive, Label, Placement};
use crate::core::graph::BranchGraph;
use crate::core::types::{
    ArchiveLocation, BranchName, FileId, RevisionId, UserName, UtcTimestamp,
};

/// Errors from label and revision resolution.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("label '{label}' not found in archive {file_id}")]
    UnknownLabel { file_id: FileId, label: String },

    #[error("label '{label}' already marks revision {revision} in archive {file_id}")]
    LabelExists {
        file_id: FileId,
        label: String,
        revision: RevisionId,
    },

    #[error("invalid label name: {0}")]
    InvalidLabel(String),

    #[error("revision {revision} not found in archive {file_id}")]
    RevisionNotFound {
        file_id: FileId,
        revision: RevisionId,
    },
}

/// The revision a branch reads and builds on.
pub fn resolve_default_revision(
    archive: &Archive,
    graph: &BranchGraph,
    branch: &BranchName,
) -> RevisionId {
    graph
        .lineage(branch)
        .iter()
        .find_map(|b| archive.header().view(b).and_then(|v| v.tip.clone()))
        .unwrap_or_else(|| archive.trunk_tip())
}

/// The branch's own tip, if it has diverged from its parent.
pub fn own_tip(archive: &Archive, branch: &BranchName) -> Option<RevisionId> {
    archive.header().view(branch).and_then(|v| v.tip.clone())
}

/// Where a checkin on `branch` stores its revision.
///
/// A branch with its own tip extends it (or forks from it when another
/// lineage has since grown past it); trunk extends the trunk lineage; any
/// other branch forks from its default revision.
pub fn checkin_placement(archive: &Archive, graph: &BranchGraph, branch: &BranchName) -> Placement {
    if let Some(tip) = own_tip(archive, branch) {
        return if archive.lineage_tip(&tip) == Some(&tip) {
            Placement::Extend(tip)
        } else {
            Placement::Fork(tip)
        };
    }
    if branch.is_trunk() {
        Placement::Extend(archive.trunk_tip())
    } else {
        Placement::Fork(resolve_default_revision(archive, graph, branch))
    }
}

/// Location inherited from the branch's ancestors, ignoring its own override.
pub fn inherited_location(
    archive: &Archive,
    graph: &BranchGraph,
    branch: &BranchName,
) -> ArchiveLocation {
    graph
        .ancestors(branch)
        .iter()
        .find_map(|b| archive.header().view(b).and_then(|v| v.location.clone()))
        .unwrap_or_else(|| archive.header().home.clone())
}

/// Number of branch levels a revision sits below the trunk spine.
pub fn branch_depth_of(revision: &RevisionId) -> usize {
    revision.depth()
}

/// Nearest revision on both parent chains.
///
/// # Example
///
/// ```
/// use branchvault::core::types::RevisionId;
/// use branchvault::tree::common_ancestor;
///
/// let a = RevisionId::new("1.3.1.2").unwrap();
/// let b = RevisionId::new("1.5").unwrap();
/// assert_eq!(common_ancestor(&a, &b).to_string(), "1.3");
/// ```
pub fn common_ancestor(a: &RevisionId, b: &RevisionId) -> RevisionId {
    let mut chain = Vec::new();
    let mut current = Some(a.clone());
    while let Some(rev) = current {
        current = rev.parent();
        chain.push(rev);
    }

    let mut current = Some(b.clone());
    while let Some(rev) = current {
        if chain.contains(&rev) {
            return rev;
        }
        current = rev.parent();
    }
    RevisionId::root()
}

fn validate_label(name: &str) -> Result<(), TreeError> {
    if name.trim().is_empty() {
        return Err(TreeError::InvalidLabel("label cannot be empty".into()));
    }
    if name.len() > 256 {
        return Err(TreeError::InvalidLabel(
            "label cannot exceed 256 bytes".into(),
        ));
    }
    if name.chars().any(char::is_control) {
        return Err(TreeError::InvalidLabel(
            "label cannot contain control characters".into(),
        ));
    }
    Ok(())
}

fn find_label<'a>(archive: &'a Archive, name: &str) -> Option<&'a Label> {
    archive.header().labels.iter().find(|l| l.name == name)
}

/// The revision a label marks.
pub fn resolve_label(archive: &Archive, name: &str) -> Result<RevisionId, TreeError> {
    let label = find_label(archive, name).ok_or_else(|| TreeError::UnknownLabel {
        file_id: archive.file_id(),
        label: name.to_string(),
    })?;
    if label.floating {
        Ok(archive
            .lineage_tip(&label.revision)
            .cloned()
            .unwrap_or_else(|| label.revision.clone()))
    } else {
        Ok(label.revision.clone())
    }
}

/// Bind `name` to `revision`.
///
/// An existing label of the same name is an error unless `reuse` is set, in
/// which case it is moved.
pub fn apply_label(
    archive: &mut Archive,
    revision: &RevisionId,
    name: &str,
    floating: bool,
    reuse: bool,
    user: &UserName,
) -> Result<(), TreeError> {
    validate_label(name)?;
    if !archive.contains(revision) {
        return Err(TreeError::RevisionNotFound {
            file_id: archive.file_id(),
            revision: revision.clone(),
        });
    }
    if let Some(existing) = find_label(archive, name) {
        if !reuse {
            return Err(TreeError::LabelExists {
                file_id: archive.file_id(),
                label: name.to_string(),
                revision: existing.revision.clone(),
            });
        }
    }

    let header = archive.header_mut();
    header.labels.retain(|l| l.name != name);
    header.labels.push(Label {
        name: name.to_string(),
        revision: revision.clone(),
        floating,
        created_by: user.clone(),
        created_at: UtcTimestamp::now(),
    });
    Ok(())
}

/// Remove a label, returning what it marked.
pub fn remove_label(archive: &mut Archive, name: &str) -> Result<Label, TreeError> {
    let position = archive
        .header()
        .labels
        .iter()
        .position(|l| l.name == name)
        .ok_or_else(|| TreeError::UnknownLabel {
            file_id: archive.file_id(),
            label: name.to_string(),
        })?;
    Ok(archive.header_mut().labels.remove(position))
}

/// Bind `new_name` to whatever `existing` resolves to, copying its
/// floating flag.
pub fn duplicate_label(
    archive: &mut Archive,
    existing: &str,
    new_name: &str,
    reuse: bool,
    user: &UserName,
) -> Result<RevisionId, TreeError> {
    let revision = resolve_label(archive, existing)?;
    let floating = find_label(archive, existing).is_some_and(|l| l.floating);
    apply_label(archive, &revision, new_name, floating, reuse, user)?;
    Ok(revision)
}

/// Labels marking `revision`.
pub fn labels_on(archive: &Archive, revision: &RevisionId) -> Vec<String> {
    archive
        .header()
        .labels
        .iter()
        .filter(|l| {
            if l.floating {
                archive.lineage_tip(&l.revision) == Some(revision)
            } else {
                &l.revision == revision
            }
        })
        .map(|l| l.name.clone())
        .collect()
}

/// Where the archive's workfile lives on `branch`.
pub fn resolve_location(
    archive: &Archive,
    graph: &BranchGraph,
    branch: &BranchName,
) -> ArchiveLocation {
    graph
        .lineage(branch)
        .iter()
        .find_map(|b| archive.header().view(b).and_then(|v| v.location.clone()))
        .unwrap_or_else(|| archive.header().home.clone())
}

/// Whether the archive exists from `branch`'s point of view.
pub fn is_visible(archive: &Archive, graph: &BranchGraph, branch: &BranchName) -> bool {
    let header = archive.header();
    if header.cemetery.is_some() {
        return false;
    }
    if let Some(origin) = &header.origin {
        if !graph.is_self_or_ancestor(origin, branch) {
            return false;
        }
    }
    !graph
        .lineage(branch)
        .iter()
        .any(|b| header.view(b).is_some_and(|v| v.deleted))
}

/// One line of revision history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionSummary {
    pub id: RevisionId,
    pub author: UserName,
    pub timestamp: UtcTimestamp,
    pub description: String,
    pub size: u64,
    pub labels: Vec<String>,
}

/// Every revision, trunk lineage first, newest first within each lineage.
pub fn history(archive: &Archive) -> Vec<RevisionSummary> {
    let mut summaries: Vec<RevisionSummary> = archive
        .revisions()
        .map(|r| RevisionSummary {
            id: r.id.clone(),
            author: r.author.clone(),
            timestamp: r.timestamp.clone(),
            description: r.description.clone(),
            size: r.size,
            labels: labels_on(archive, &r.id),
        })
        .collect();
    summaries.sort_by_key(|s| (s.id.fork_point(), s.id.branch_number(), Reverse(s.id.minor())));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{Attributes, NewRevision, Placement};
    use crate::codec::CompressionKind;

    fn user() -> UserName {
        UserName::new("ann").unwrap()
    }

    fn rev(s: &str) -> RevisionId {
        RevisionId::new(s).unwrap()
    }

    fn b(s: &str) -> BranchName {
        BranchName::new(s).unwrap()
    }

    fn new_rev(content: &str) -> NewRevision {
        NewRevision {
            content: content.as_bytes().to_vec(),
            author: user(),
            timestamp: UtcTimestamp::now(),
            description: content.to_string(),
        }
    }

    fn graph() -> BranchGraph {
        let mut g = BranchGraph::new();
        g.add_branch(b("dev"), BranchName::trunk(), user()).unwrap();
        g.add_branch(b("fix"), b("dev"), user()).unwrap();
        g.add_branch(b("other"), BranchName::trunk(), user()).unwrap();
        g
    }

    /// Trunk 1.1..1.3, dev forked at 1.2 with one revision.
    fn archive() -> Archive {
        let mut a = Archive::create(
            ArchiveLocation::new("src", "main.rs").unwrap(),
            None,
            Attributes::default(),
            "",
            new_rev("1\n"),
            CompressionKind::Lz4,
        );
        a.store_revision(Placement::Extend(rev("1.1")), new_rev("2\n"), CompressionKind::Lz4)
            .unwrap();
        a.store_revision(Placement::Extend(rev("1.2")), new_rev("3\n"), CompressionKind::Lz4)
            .unwrap();
        let dev_tip = a
            .store_revision(Placement::Fork(rev("1.2")), new_rev("2-dev\n"), CompressionKind::Lz4)
            .unwrap();
        a.header_mut().view_mut(&b("dev")).tip = Some(dev_tip);
        a
    }

    #[test]
    fn default_revision_walks_up_branch_chain() {
        let a = archive();
        let g = graph();
        assert_eq!(resolve_default_revision(&a, &g, &BranchName::trunk()), rev("1.3"));
        assert_eq!(resolve_default_revision(&a, &g, &b("dev")), rev("1.2.1.1"));
        assert_eq!(resolve_default_revision(&a, &g, &b("fix")), rev("1.2.1.1"));
        assert_eq!(resolve_default_revision(&a, &g, &b("other")), rev("1.3"));
    }

    #[test]
    fn common_ancestor_cases() {
        assert_eq!(common_ancestor(&rev("1.2.1.1"), &rev("1.3")), rev("1.2"));
        assert_eq!(common_ancestor(&rev("1.3"), &rev("1.3")), rev("1.3"));
        assert_eq!(common_ancestor(&rev("1.2.1.3"), &rev("1.2.2.1")), rev("1.2"));
        assert_eq!(common_ancestor(&rev("1.2.1.1.1.1"), &rev("1.2.1.4")), rev("1.2.1.1"));
        assert_eq!(common_ancestor(&rev("1.1"), &rev("1.9")), rev("1.1"));
        assert_eq!(branch_depth_of(&rev("1.2.1.1.1.1")), 2);
    }

    #[test]
    fn fixed_and_floating_labels() {
        let mut a = archive();
        apply_label(&mut a, &rev("1.3"), "fixed", false, false, &user()).unwrap();
        apply_label(&mut a, &rev("1.3"), "float", true, false, &user()).unwrap();

        a.store_revision(Placement::Extend(rev("1.3")), new_rev("4\n"), CompressionKind::Lz4)
            .unwrap();

        assert_eq!(resolve_label(&a, "fixed").unwrap(), rev("1.3"));
        assert_eq!(resolve_label(&a, "float").unwrap(), rev("1.4"));
        assert_eq!(labels_on(&a, &rev("1.4")), vec!["float".to_string()]);
    }

    #[test]
    fn duplicate_label_name_rejected_unless_reused() {
        let mut a = archive();
        apply_label(&mut a, &rev("1.1"), "rel", false, false, &user()).unwrap();
        assert!(matches!(
            apply_label(&mut a, &rev("1.2"), "rel", false, false, &user()),
            Err(TreeError::LabelExists { .. })
        ));
        apply_label(&mut a, &rev("1.2"), "rel", false, true, &user()).unwrap();
        assert_eq!(resolve_label(&a, "rel").unwrap(), rev("1.2"));
        assert_eq!(a.header().labels.len(), 1);
    }

    #[test]
    fn label_validation_and_missing_revision() {
        let mut a = archive();
        assert!(matches!(
            apply_label(&mut a, &rev("1.1"), "", false, false, &user()),
            Err(TreeError::InvalidLabel(_))
        ));
        assert!(matches!(
            apply_label(&mut a, &rev("1.9"), "x", false, false, &user()),
            Err(TreeError::RevisionNotFound { .. })
        ));
    }

    #[test]
    fn remove_and_duplicate() {
        let mut a = archive();
        apply_label(&mut a, &rev("1.3"), "tip", true, false, &user()).unwrap();
        let at = duplicate_label(&mut a, "tip", "copy", false, &user()).unwrap();
        assert_eq!(at, rev("1.3"));
        let copy = remove_label(&mut a, "copy").unwrap();
        assert!(copy.floating);
        assert!(matches!(
            remove_label(&mut a, "copy"),
            Err(TreeError::UnknownLabel { .. })
        ));
        assert!(matches!(
            resolve_label(&a, "nothing"),
            Err(TreeError::UnknownLabel { .. })
        ));
    }

    #[test]
    fn location_overrides_are_inherited() {
        let mut a = archive();
        let g = graph();
        let renamed = ArchiveLocation::new("src", "lib.rs").unwrap();
        a.header_mut().view_mut(&b("dev")).location = Some(renamed.clone());

        assert_eq!(resolve_location(&a, &g, &b("fix")), renamed);
        assert_eq!(resolve_location(&a, &g, &b("dev")), renamed);
        assert_eq!(resolve_location(&a, &g, &BranchName::trunk()).short_name(), "main.rs");
    }

    #[test]
    fn visibility_rules() {
        let mut a = archive();
        let g = graph();
        assert!(is_visible(&a, &g, &b("fix")));

        a.header_mut().view_mut(&b("dev")).deleted = true;
        assert!(!is_visible(&a, &g, &b("dev")));
        assert!(!is_visible(&a, &g, &b("fix")));
        assert!(is_visible(&a, &g, &BranchName::trunk()));

        a.header_mut().view_mut(&b("dev")).deleted = false;
        a.header_mut().origin = Some(b("dev"));
        assert!(is_visible(&a, &g, &b("fix")));
        assert!(!is_visible(&a, &g, &BranchName::trunk()));
        assert!(!is_visible(&a, &g, &b("other")));
    }

    #[test]
    fn checkin_placement_by_branch_state() {
        let a = archive();
        let g = graph();
        assert_eq!(
            checkin_placement(&a, &g, &BranchName::trunk()),
            Placement::Extend(rev("1.3"))
        );
        assert_eq!(
            checkin_placement(&a, &g, &b("dev")),
            Placement::Extend(rev("1.2.1.1"))
        );
        assert_eq!(
            checkin_placement(&a, &g, &b("fix")),
            Placement::Fork(rev("1.2.1.1"))
        );
        assert_eq!(
            checkin_placement(&a, &g, &b("other")),
            Placement::Fork(rev("1.3"))
        );
    }

    #[test]
    fn history_orders_lineages() {
        let a = archive();
        let ids: Vec<String> = history(&a).into_iter().map(|s| s.id.to_string()).collect();
        assert_eq!(ids, vec!["1.3", "1.2", "1.1", "1.2.1.1"]);
    }
}
