//! promote::engine
//!
//! Applies one [`FilePromotionInfo`] to an in-memory archive.
//!
//! # Architecture
//!
//! Each promotion type edits branch views on the archive header:
//!
//! | Type | Parent branch | Child branch |
//! |------|---------------|--------------|
//! | `Simple` | untouched, merged content returned | own tip cleared |
//! | `FileCreated` | archive made visible, seeded with child content | view removed |
//! | `FileDeleted` | deleted flag, or cemetery on trunk | view removed |
//! | rename/move | child location copied | location override cleared, then `Simple` |
//!
//! Every completed promotion appends a [`PromotionRecord`] to the header.
//! Nothing here is durable until the caller commits the archive.

use std::collections::HashSet;

use super::info::{promotion_candidate, FilePromotionInfo, PromotionType};
use super::merge::{three_way_merge, MergeOutcome};
use super::workarea::WorkArea;
use super::PromoteError;
use crate::archive::{Archive, NewRevision, PromotionRecord, RevisionSource};
use crate::codec::CompressionKind;
use crate::core::graph::BranchGraph;
use crate::core::types::{ArchiveLocation, BranchName, FileId, RevisionId, UserName, UtcTimestamp};
use crate::tree;

/// Caller-supplied environment for one promotion.
pub struct PromotionContext<'a> {
    pub user: &'a UserName,
    pub timestamp: UtcTimestamp,
    pub work_area: &'a dyn WorkArea,
    /// Appended to a created file's name when an uncontrolled working file
    /// already occupies its location on the parent.
    pub promoted_suffix: &'a str,
    pub compression: CompressionKind,
    /// Locations of other archives visible on the target branch.
    pub controlled: &'a HashSet<ArchiveLocation>,
}

/// What a promotion did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromoteOutcome {
    /// Nothing pending: the promotion already happened.
    AlreadyPromoted,
    /// Clean merge. `content` is the parent's new content, based on `base`.
    Merged {
        content: Vec<u8>,
        location: ArchiveLocation,
        base: RevisionId,
    },
    /// Overlapping edits; the caller resolves from the three buffers.
    Conflict {
        ancestor: Vec<u8>,
        parent_tip: Vec<u8>,
        child_tip: Vec<u8>,
        ancestor_id: RevisionId,
        parent_id: RevisionId,
        child_id: RevisionId,
        location: ArchiveLocation,
    },
    /// Only the name or path changed.
    Relocated {
        from: ArchiveLocation,
        to: ArchiveLocation,
    },
    /// The archive became visible on the parent.
    Created {
        location: ArchiveLocation,
        revision: RevisionId,
        content: Vec<u8>,
        /// Uncontrolled working file left in place at the intended location.
        collision: Option<ArchiveLocation>,
    },
    /// The archive was deleted on the parent.
    Deleted {
        location: ArchiveLocation,
        buried: bool,
        /// The parent's working copy exists and may be removed.
        remove_workfile: bool,
    },
}

/// Summary of one promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoteResult {
    pub file_id: FileId,
    pub promotion_type: PromotionType,
    pub source_revision: Option<RevisionId>,
    /// Location change applied to the parent, for rename/move types.
    pub relocated: Option<(ArchiveLocation, ArchiveLocation)>,
    pub outcome: PromoteOutcome,
}

impl PromoteResult {
    pub fn is_conflict(&self) -> bool {
        matches!(self.outcome, PromoteOutcome::Conflict { .. })
    }
}

/// Promote one archive from `info.source_branch` into its parent.
///
/// The caller must hold the archive exclusively and commit it afterwards
/// when it is dirty.
///
/// # Errors
///
/// Structural errors (`RootBranch`, `NotParent`, `NotCreatedOnBranch`,
/// `ControlledCollision`, `Locked`) leave the archive untouched. Archive
/// read errors may leave staged header edits; the caller discards the
/// in-memory archive on error.
pub fn promote_file(
    archive: &mut Archive,
    graph: &BranchGraph,
    info: &FilePromotionInfo,
    ctx: &PromotionContext<'_>,
) -> Result<PromoteResult, PromoteError> {
    let source = &info.source_branch;
    let target = &info.target_branch;
    let parent = graph
        .parent(source)
        .ok_or_else(|| PromoteError::RootBranch(source.clone()))?;
    if parent != target {
        return Err(PromoteError::NotParent {
            branch: source.clone(),
            target: target.clone(),
        });
    }

    let mut result = PromoteResult {
        file_id: archive.file_id(),
        promotion_type: info.promotion_type,
        source_revision: info.source_revision.clone(),
        relocated: None,
        outcome: PromoteOutcome::AlreadyPromoted,
    };

    if already_recorded(archive, info) {
        tracing::debug!(file_id = %archive.file_id(), branch = %source, "promotion already recorded");
        return Ok(result);
    }
    if info.promotion_type == PromotionType::FileCreated
        && archive.header().origin.as_ref() != Some(source)
        && archive.header().cemetery.is_none()
    {
        return Err(PromoteError::NotCreatedOnBranch {
            file_id: archive.file_id(),
            branch: source.clone(),
        });
    }
    if !is_pending(archive, graph, info) {
        tracing::debug!(file_id = %archive.file_id(), branch = %source, "nothing pending to promote");
        return Ok(result);
    }

    result.outcome = match info.promotion_type {
        PromotionType::Simple => {
            let (outcome, child) = merge_content(archive, graph, source, target)?;
            result.source_revision = Some(child);
            outcome
        }
        PromotionType::FileCreated => {
            let (outcome, child) = promote_created(archive, graph, source, target, ctx)?;
            result.source_revision = Some(child);
            outcome
        }
        PromotionType::FileDeleted => promote_deleted(archive, graph, source, target, ctx)?,
        PromotionType::FileNameChange
        | PromotionType::FileLocationChange
        | PromotionType::LocationAndNameDiffer => {
            let from = tree::resolve_location(archive, graph, target);
            let to = tree::resolve_location(archive, graph, source);
            relocate(archive, graph, source, target, &to);
            result.relocated = Some((from.clone(), to.clone()));

            if tree::own_tip(archive, source).is_some() {
                let (outcome, child) = merge_content(archive, graph, source, target)?;
                result.source_revision = Some(child);
                outcome
            } else {
                PromoteOutcome::Relocated { from, to }
            }
        }
    };

    let recorded = result
        .source_revision
        .clone()
        .unwrap_or_else(|| tree::resolve_default_revision(archive, graph, source));
    archive.header_mut().prune_views();
    archive.header_mut().promotions.push(PromotionRecord {
        source_branch: source.clone(),
        target_branch: target.clone(),
        source_revision: recorded,
        user: ctx.user.clone(),
        at: ctx.timestamp.clone(),
    });

    tracing::info!(
        file_id = %result.file_id,
        from = %source,
        into = %target,
        kind = %info.promotion_type,
        conflict = result.is_conflict(),
        "file promoted"
    );
    Ok(result)
}

fn already_recorded(archive: &Archive, info: &FilePromotionInfo) -> bool {
    let Some(revision) = &info.source_revision else {
        return false;
    };
    archive.header().promotions.iter().any(|p| {
        p.source_branch == info.source_branch
            && p.target_branch == info.target_branch
            && &p.source_revision == revision
    })
}

fn is_pending(archive: &Archive, graph: &BranchGraph, info: &FilePromotionInfo) -> bool {
    let Some(current) = promotion_candidate(archive, graph, &info.source_branch) else {
        return false;
    };
    match info.promotion_type {
        PromotionType::Simple => current.source_revision.is_some(),
        PromotionType::FileCreated | PromotionType::FileDeleted => {
            current.promotion_type == info.promotion_type
        }
        PromotionType::FileNameChange
        | PromotionType::FileLocationChange
        | PromotionType::LocationAndNameDiffer => {
            current.target_location.as_ref() != Some(&current.source_location)
        }
    }
}

/// Merge the child's tip into the parent's default revision and clear the
/// child's anchor. Returns the outcome and the child tip merged.
fn merge_content(
    archive: &mut Archive,
    graph: &BranchGraph,
    source: &BranchName,
    target: &BranchName,
) -> Result<(PromoteOutcome, RevisionId), PromoteError> {
    let child_id = tree::resolve_default_revision(archive, graph, source);
    let parent_id = tree::resolve_default_revision(archive, graph, target);
    let ancestor_id = tree::common_ancestor(&child_id, &parent_id);
    let location = tree::resolve_location(archive, graph, target);

    let ancestor = archive.fetch(&ancestor_id)?;
    let parent_tip = archive.fetch(&parent_id)?;
    let child_tip = archive.fetch(&child_id)?;

    let merged = if parent_tip == ancestor {
        MergeOutcome::Clean(child_tip.clone())
    } else if child_tip == ancestor || child_tip == parent_tip {
        MergeOutcome::Clean(parent_tip.clone())
    } else if archive.header().attributes.binary {
        MergeOutcome::Overlap(1)
    } else {
        three_way_merge(&ancestor, &parent_tip, &child_tip)
    };

    archive.header_mut().view_mut(source).tip = None;

    let outcome = match merged {
        MergeOutcome::Clean(content) => PromoteOutcome::Merged {
            content,
            location,
            base: parent_id,
        },
        MergeOutcome::Overlap(count) => {
            tracing::warn!(
                file_id = %archive.file_id(),
                overlaps = count,
                ancestor = %ancestor_id,
                parent = %parent_id,
                child = %child_id,
                "promotion has overlapping edits"
            );
            PromoteOutcome::Conflict {
                ancestor,
                parent_tip,
                child_tip,
                ancestor_id,
                parent_id,
                child_id: child_id.clone(),
                location,
            }
        }
    };
    Ok((outcome, child_id))
}

fn promote_created(
    archive: &mut Archive,
    graph: &BranchGraph,
    source: &BranchName,
    target: &BranchName,
    ctx: &PromotionContext<'_>,
) -> Result<(PromoteOutcome, RevisionId), PromoteError> {
    let intended = tree::resolve_location(archive, graph, source);
    if ctx.controlled.contains(&intended) {
        return Err(PromoteError::ControlledCollision {
            location: intended,
            branch: target.clone(),
        });
    }
    let (location, collision) = if ctx.work_area.contains(target, &intended) {
        (intended.with_suffix(ctx.promoted_suffix), Some(intended.clone()))
    } else {
        (intended.clone(), None)
    };

    let child_id = tree::resolve_default_revision(archive, graph, source);
    let content = archive.fetch(&child_id)?;

    // The archive becomes visible on the target before its placement is
    // computed, so the target's default revision is on the trunk lineage.
    {
        let header = archive.header_mut();
        header.origin = (!target.is_trunk()).then(|| target.clone());
        header.views.remove(source);
    }

    let revision = if tree::resolve_default_revision(archive, graph, target) == child_id {
        child_id.clone()
    } else {
        let placement = tree::checkin_placement(archive, graph, target);
        archive.store_revision(
            placement,
            NewRevision {
                content: content.clone(),
                author: ctx.user.clone(),
                timestamp: ctx.timestamp.clone(),
                description: format!("promoted from {source}"),
            },
            ctx.compression,
        )?
    };
    if !target.is_trunk() {
        archive.header_mut().view_mut(target).tip = Some(revision.clone());
    }
    if tree::resolve_location(archive, graph, target) != location {
        archive.header_mut().view_mut(target).location = Some(location.clone());
    }

    if let Some(existing) = &collision {
        tracing::warn!(
            file_id = %archive.file_id(),
            existing = %existing,
            staged = %location,
            "uncontrolled file in the way; staged under a new name"
        );
    }

    Ok((
        PromoteOutcome::Created {
            location,
            revision,
            content,
            collision,
        },
        child_id,
    ))
}

fn promote_deleted(
    archive: &mut Archive,
    graph: &BranchGraph,
    source: &BranchName,
    target: &BranchName,
    ctx: &PromotionContext<'_>,
) -> Result<PromoteOutcome, PromoteError> {
    let location = tree::resolve_location(archive, graph, target);
    if !archive.header().locks.is_empty() {
        return Err(PromoteError::Locked {
            file_id: archive.file_id(),
            branch: target.clone(),
        });
    }

    let buried = target.is_trunk();
    if buried {
        archive.header_mut().views.remove(source);
        archive.enter_cemetery(ctx.user.clone(), ctx.timestamp.clone());
    } else {
        let header = archive.header_mut();
        header.views.remove(source);
        header.view_mut(target).deleted = true;
    }

    let remove_workfile = ctx.work_area.contains(target, &location);
    Ok(PromoteOutcome::Deleted {
        location,
        buried,
        remove_workfile,
    })
}

/// Copy the child's location onto the parent and drop the child's override.
fn relocate(
    archive: &mut Archive,
    graph: &BranchGraph,
    source: &BranchName,
    target: &BranchName,
    to: &ArchiveLocation,
) {
    let inherited = tree::inherited_location(archive, graph, target);
    let header = archive.header_mut();
    header.view_mut(source).location = None;
    header.view_mut(target).location = (&inherited != to).then(|| to.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Attributes;
    use crate::promote::workarea::NoWorkArea;

    struct Present(ArchiveLocation);

    impl WorkArea for Present {
        fn contains(&self, _branch: &BranchName, location: &ArchiveLocation) -> bool {
            location == &self.0
        }
    }

    fn user() -> UserName {
        UserName::new("ann").unwrap()
    }

    fn b(s: &str) -> BranchName {
        BranchName::new(s).unwrap()
    }

    fn rev(s: &str) -> RevisionId {
        RevisionId::new(s).unwrap()
    }

    fn loc(dir: &str, name: &str) -> ArchiveLocation {
        ArchiveLocation::new(dir, name).unwrap()
    }

    fn new_rev(content: &str) -> NewRevision {
        NewRevision {
            content: content.as_bytes().to_vec(),
            author: user(),
            timestamp: UtcTimestamp::now(),
            description: String::new(),
        }
    }

    fn graph() -> BranchGraph {
        let mut g = BranchGraph::new();
        g.add_branch(b("dev"), BranchName::trunk(), user()).unwrap();
        g.add_branch(b("fix"), b("dev"), user()).unwrap();
        g
    }

    fn checkin(a: &mut Archive, g: &BranchGraph, branch: &BranchName, content: &str) -> RevisionId {
        let placement = tree::checkin_placement(a, g, branch);
        let id = a
            .store_revision(placement, new_rev(content), CompressionKind::None)
            .unwrap();
        if !branch.is_trunk() {
            a.header_mut().view_mut(branch).tip = Some(id.clone());
        }
        id
    }

    fn trunk_archive(content: &str) -> Archive {
        Archive::create(
            loc("src", "foo.txt"),
            None,
            Attributes::default(),
            "",
            new_rev(content),
            CompressionKind::None,
        )
    }

    fn promote(
        a: &mut Archive,
        g: &BranchGraph,
        branch: &BranchName,
        area: &dyn WorkArea,
    ) -> Result<PromoteResult, PromoteError> {
        let info = promotion_candidate(a, g, branch).expect("pending promotion");
        let controlled = HashSet::new();
        let ctx = PromotionContext {
            user: &user(),
            timestamp: UtcTimestamp::now(),
            work_area: area,
            promoted_suffix: "-promoted",
            compression: CompressionKind::None,
            controlled: &controlled,
        };
        promote_file(a, g, &info, &ctx)
    }

    const BASE: &str = "a\nb\nc\nd\ne\n";

    #[test]
    fn simple_merge_clears_anchor() {
        let g = graph();
        let dev = b("dev");
        let mut a = trunk_archive(BASE);
        checkin(&mut a, &g, &dev, "a\nb\nc\nd\nE\n");
        checkin(&mut a, &g, &BranchName::trunk(), "A\nb\nc\nd\ne\n");

        let result = promote(&mut a, &g, &dev, &NoWorkArea).unwrap();
        match &result.outcome {
            PromoteOutcome::Merged { content, base, .. } => {
                assert_eq!(content, b"A\nb\nc\nd\nE\n");
                assert_eq!(base, &rev("1.2"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(result.source_revision, Some(rev("1.1.1.1")));
        assert!(tree::own_tip(&a, &dev).is_none());
        assert_eq!(tree::resolve_default_revision(&a, &g, &dev), rev("1.2"));
        assert_eq!(a.header().promotions.len(), 1);
        assert!(promotion_candidate(&a, &g, &dev).is_none());
    }

    #[test]
    fn overlap_reports_three_buffers_and_still_advances() {
        let g = graph();
        let dev = b("dev");
        let mut a = trunk_archive(BASE);
        checkin(&mut a, &g, &dev, "a\nb\nCHILD\nd\ne\n");
        checkin(&mut a, &g, &BranchName::trunk(), "a\nb\nPARENT\nd\ne\n");

        let result = promote(&mut a, &g, &dev, &NoWorkArea).unwrap();
        match &result.outcome {
            PromoteOutcome::Conflict {
                ancestor,
                parent_tip,
                child_tip,
                ancestor_id,
                ..
            } => {
                assert_eq!(ancestor, BASE.as_bytes());
                assert_eq!(parent_tip, b"a\nb\nPARENT\nd\ne\n");
                assert_eq!(child_tip, b"a\nb\nCHILD\nd\ne\n");
                assert_eq!(ancestor_id, &rev("1.1"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(tree::own_tip(&a, &dev).is_none());
    }

    #[test]
    fn binary_changed_on_both_sides_conflicts() {
        let g = graph();
        let dev = b("dev");
        let mut a = trunk_archive("\u{0}\u{1}\n");
        a.header_mut().attributes.binary = true;
        checkin(&mut a, &g, &dev, "\u{0}\u{2}\n");
        checkin(&mut a, &g, &BranchName::trunk(), "\u{0}\u{3}\n");
        let result = promote(&mut a, &g, &dev, &NoWorkArea).unwrap();
        assert!(result.is_conflict());
    }

    #[test]
    fn repeated_promotion_is_noop() {
        let g = graph();
        let dev = b("dev");
        let mut a = trunk_archive(BASE);
        checkin(&mut a, &g, &dev, "changed\n");
        let info = promotion_candidate(&a, &g, &dev).unwrap();
        let controlled = HashSet::new();
        let ctx = PromotionContext {
            user: &user(),
            timestamp: UtcTimestamp::now(),
            work_area: &NoWorkArea,
            promoted_suffix: "-promoted",
            compression: CompressionKind::None,
            controlled: &controlled,
        };
        let first = promote_file(&mut a, &g, &info, &ctx).unwrap();
        assert!(matches!(first.outcome, PromoteOutcome::Merged { .. }));
        let again = promote_file(&mut a, &g, &info, &ctx).unwrap();
        assert_eq!(again.outcome, PromoteOutcome::AlreadyPromoted);
        assert_eq!(a.header().promotions.len(), 1);
    }

    #[test]
    fn only_direct_parent_receives() {
        let g = graph();
        let mut a = trunk_archive(BASE);
        checkin(&mut a, &g, &b("fix"), "x\n");
        let mut info = promotion_candidate(&a, &g, &b("fix")).unwrap();
        assert_eq!(info.target_branch, b("dev"));
        info.target_branch = BranchName::trunk();
        let controlled = HashSet::new();
        let ctx = PromotionContext {
            user: &user(),
            timestamp: UtcTimestamp::now(),
            work_area: &NoWorkArea,
            promoted_suffix: "-promoted",
            compression: CompressionKind::None,
            controlled: &controlled,
        };
        assert!(matches!(
            promote_file(&mut a, &g, &info, &ctx),
            Err(PromoteError::NotParent { .. })
        ));
        info.source_branch = BranchName::trunk();
        assert!(matches!(
            promote_file(&mut a, &g, &info, &ctx),
            Err(PromoteError::RootBranch(_))
        ));
    }

    #[test]
    fn created_file_collides_with_uncontrolled_workfile() {
        let g = graph();
        let dev = b("dev");
        let mut a = Archive::create(
            loc("src", "foo.txt"),
            Some(dev.clone()),
            Attributes::default(),
            "",
            new_rev("new\n"),
            CompressionKind::None,
        );
        assert!(!tree::is_visible(&a, &g, &BranchName::trunk()));

        let area = Present(loc("src", "foo.txt"));
        let result = promote(&mut a, &g, &dev, &area).unwrap();
        match &result.outcome {
            PromoteOutcome::Created {
                location,
                collision,
                content,
                revision,
            } => {
                assert_eq!(location, &loc("src", "foo.txt-promoted"));
                assert_eq!(collision.as_ref(), Some(&loc("src", "foo.txt")));
                assert_eq!(content, b"new\n");
                assert_eq!(revision, &rev("1.1"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(tree::is_visible(&a, &g, &BranchName::trunk()));
        assert_eq!(
            tree::resolve_location(&a, &g, &BranchName::trunk()),
            loc("src", "foo.txt-promoted")
        );
        assert!(a.header().view(&dev).is_none());
    }

    #[test]
    fn created_file_rejects_controlled_collision() {
        let g = graph();
        let dev = b("dev");
        let mut a = Archive::create(
            loc("src", "foo.txt"),
            Some(dev.clone()),
            Attributes::default(),
            "",
            new_rev("new\n"),
            CompressionKind::None,
        );
        let info = promotion_candidate(&a, &g, &dev).unwrap();
        let controlled: HashSet<_> = [loc("src", "foo.txt")].into_iter().collect();
        let ctx = PromotionContext {
            user: &user(),
            timestamp: UtcTimestamp::now(),
            work_area: &NoWorkArea,
            promoted_suffix: "-promoted",
            compression: CompressionKind::None,
            controlled: &controlled,
        };
        assert!(matches!(
            promote_file(&mut a, &g, &info, &ctx),
            Err(PromoteError::ControlledCollision { .. })
        ));
        assert_eq!(a.header().origin.as_ref(), Some(&dev));
    }

    #[test]
    fn created_on_grandchild_lands_on_middle_branch() {
        let g = graph();
        let fix = b("fix");
        let mut a = Archive::create(
            loc("", "note.md"),
            Some(fix.clone()),
            Attributes::default(),
            "",
            new_rev("n\n"),
            CompressionKind::None,
        );
        checkin(&mut a, &g, &fix, "n2\n");

        let result = promote(&mut a, &g, &fix, &NoWorkArea).unwrap();
        assert!(matches!(result.outcome, PromoteOutcome::Created { .. }));
        assert_eq!(a.header().origin.as_ref(), Some(&b("dev")));
        assert!(tree::is_visible(&a, &g, &b("dev")));
        assert!(!tree::is_visible(&a, &g, &BranchName::trunk()));
        assert_eq!(a.fetch(&tree::resolve_default_revision(&a, &g, &b("dev"))).unwrap(), b"n2\n");
    }

    #[test]
    fn deleted_on_branch_buries_on_trunk() {
        let g = graph();
        let dev = b("dev");
        let mut a = trunk_archive(BASE);
        a.header_mut().view_mut(&dev).deleted = true;

        let area = Present(loc("src", "foo.txt"));
        let result = promote(&mut a, &g, &dev, &area).unwrap();
        assert_eq!(
            result.outcome,
            PromoteOutcome::Deleted {
                location: loc("src", "foo.txt"),
                buried: true,
                remove_workfile: true,
            }
        );
        assert!(a.is_buried());
        assert!(a.header().view(&dev).is_none());
    }

    #[test]
    fn deleted_on_grandchild_flags_middle_branch() {
        let g = graph();
        let mut a = trunk_archive(BASE);
        a.header_mut().view_mut(&b("fix")).deleted = true;

        let result = promote(&mut a, &g, &b("fix"), &NoWorkArea).unwrap();
        assert!(matches!(
            result.outcome,
            PromoteOutcome::Deleted { buried: false, remove_workfile: false, .. }
        ));
        assert!(!tree::is_visible(&a, &g, &b("dev")));
        assert!(tree::is_visible(&a, &g, &BranchName::trunk()));
    }

    #[test]
    fn delete_into_trunk_refused_while_locked() {
        let g = graph();
        let dev = b("dev");
        let mut a = trunk_archive(BASE);
        crate::locks::lock(&mut a, &rev("1.1"), &user(), &BranchName::trunk()).unwrap();
        a.header_mut().view_mut(&dev).deleted = true;
        assert!(matches!(
            promote(&mut a, &g, &dev, &NoWorkArea),
            Err(PromoteError::Locked { .. })
        ));
        assert!(!a.is_buried());
    }

    #[test]
    fn delete_into_middle_branch_refused_while_locked() {
        let g = graph();
        let dev = b("dev");
        let mut a = trunk_archive(BASE);
        crate::locks::lock(&mut a, &rev("1.1"), &user(), &dev).unwrap();
        a.header_mut().view_mut(&b("fix")).deleted = true;
        assert!(matches!(
            promote(&mut a, &g, &b("fix"), &NoWorkArea),
            Err(PromoteError::Locked { .. })
        ));
        assert!(tree::is_visible(&a, &g, &dev));
        assert!(a.header().view(&b("fix")).is_some_and(|v| v.deleted));
    }

    #[test]
    fn rename_only_relocates_parent() {
        let g = graph();
        let dev = b("dev");
        let mut a = trunk_archive(BASE);
        a.header_mut().view_mut(&dev).location = Some(loc("src", "bar.txt"));

        let result = promote(&mut a, &g, &dev, &NoWorkArea).unwrap();
        assert_eq!(result.promotion_type, PromotionType::FileNameChange);
        assert_eq!(
            result.outcome,
            PromoteOutcome::Relocated {
                from: loc("src", "foo.txt"),
                to: loc("src", "bar.txt"),
            }
        );
        assert_eq!(
            tree::resolve_location(&a, &g, &BranchName::trunk()),
            loc("src", "bar.txt")
        );
        assert!(a.header().view(&dev).is_none());
    }

    #[test]
    fn move_with_content_change_merges_too() {
        let g = graph();
        let dev = b("dev");
        let mut a = trunk_archive(BASE);
        checkin(&mut a, &g, &dev, "a\nb\nc\nd\nE\n");
        a.header_mut().view_mut(&dev).location = Some(loc("lib", "foo.txt"));

        let result = promote(&mut a, &g, &dev, &NoWorkArea).unwrap();
        assert_eq!(result.promotion_type, PromotionType::FileLocationChange);
        assert_eq!(
            result.relocated,
            Some((loc("src", "foo.txt"), loc("lib", "foo.txt")))
        );
        match result.outcome {
            PromoteOutcome::Merged { content, location, .. } => {
                assert_eq!(content, b"a\nb\nc\nd\nE\n");
                assert_eq!(location, loc("lib", "foo.txt"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
