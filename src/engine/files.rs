//! engine::files
//!
//! Archive lifecycle operations on a project.

use crate::archive::{Archive, Attributes, NewRevision};
use crate::codec::keywords::{self, KeywordValues};
use crate::core::graph::BranchGraph;
use crate::core::types::{ArchiveLocation, BranchName, FileId, RevisionId, TypeError};
use crate::locks::{self, UnlockBehavior};
use crate::tree::{self, RevisionSummary};
use crate::txn::{Notification, RequestContext};

use super::{EngineError, Project};

/// Which revision to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionSelector {
    /// The branch's default revision.
    Default,
    Revision(RevisionId),
    Label(String),
}

const NO_LABEL: &str = "NONE";
const MULTIPLE_LABELS: &str = "MULTIPLE LABELS";

fn expands_keywords(attributes: &Attributes) -> bool {
    attributes.expand_keywords && !attributes.binary
}

/// Values for expanding `revision` as seen from `branch`.
fn keyword_values(
    archive: &Archive,
    graph: &BranchGraph,
    branch: &BranchName,
    revision: &RevisionId,
    project: &str,
) -> KeywordValues {
    let header = archive.header();
    let location = tree::resolve_location(archive, graph, branch);
    let entry = archive.revision(revision);
    let labels: Vec<&str> = header
        .labels
        .iter()
        .filter(|l| tree::resolve_label(archive, &l.name).is_ok_and(|r| &r == revision))
        .map(|l| l.name.as_str())
        .collect();
    KeywordValues {
        revision: revision.to_string(),
        author: entry.map(|e| e.author.to_string()).unwrap_or_default(),
        date: entry
            .map(|e| e.timestamp.as_datetime().format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_default(),
        owner: header.created_by.to_string(),
        file_name: location.short_name().to_string(),
        file_path: location.to_string(),
        project: project.to_string(),
        label: match labels.as_slice() {
            [] => NO_LABEL.to_string(),
            [one] => (*one).to_string(),
            _ => MULTIPLE_LABELS.to_string(),
        },
    }
}

pub(super) fn ensure_writable(graph: &BranchGraph, branch: &BranchName) -> Result<(), EngineError> {
    if graph.is_read_only(branch) {
        Err(EngineError::ReadOnlyBranch(branch.clone()))
    } else {
        Ok(())
    }
}

pub(super) fn ensure_visible(
    archive: &Archive,
    graph: &BranchGraph,
    branch: &BranchName,
) -> Result<(), EngineError> {
    graph.require(branch)?;
    if tree::is_visible(archive, graph, branch) {
        Ok(())
    } else {
        Err(EngineError::NotVisible {
            file_id: archive.file_id(),
            branch: branch.clone(),
        })
    }
}

impl Project {
    fn others_on(&self, branch: &BranchName, skip: FileId) -> Vec<ArchiveLocation> {
        let graph = self.graph();
        self.visible_on(&graph, branch, Some(skip))
            .into_iter()
            .map(|(_, loc)| loc)
            .collect()
    }

    /// Put a new file under version control on `branch`.
    ///
    /// An archive created on a branch other than trunk stays invisible to
    /// that branch's ancestors until promoted.
    ///
    /// # Errors
    ///
    /// [`EngineError::ReservedLocation`] for the cemetery and branch-archive
    /// directories, [`EngineError::AlreadyControlled`] when another archive
    /// is visible at `location` on `branch`.
    pub fn create_archive(
        &self,
        ctx: &RequestContext,
        branch: &BranchName,
        location: ArchiveLocation,
        content: Vec<u8>,
        description: &str,
        attributes: Option<Attributes>,
    ) -> Result<FileId, EngineError> {
        if location.is_reserved() {
            return Err(EngineError::ReservedLocation(location));
        }
        let namespace = self.namespace();
        {
            let graph = self.graph();
            graph.require(branch)?;
            ensure_writable(&graph, branch)?;
            if self
                .visible_on(&graph, branch, None)
                .iter()
                .any(|(_, loc)| loc == &location)
            {
                return Err(EngineError::AlreadyControlled {
                    location,
                    branch: branch.clone(),
                });
            }
        }

        let attributes = attributes.unwrap_or_else(|| Attributes {
            require_lock: self.config().require_lock(),
            ..Attributes::default()
        });
        let content = if expands_keywords(&attributes) {
            keywords::contract(&content)
        } else {
            content
        };
        let archive = Archive::create(
            location.clone(),
            (!branch.is_trunk()).then(|| branch.clone()),
            attributes,
            description,
            NewRevision {
                content,
                author: ctx.user.clone(),
                timestamp: ctx.timestamp.clone(),
                description: description.to_string(),
            },
            self.config().compression(),
        );
        let id = self.insert_archive(archive)?;
        drop(namespace);

        tracing::info!(file_id = %id, %branch, %location, user = %ctx.user, "archive created");
        self.notify(
            ctx,
            Notification::Created {
                file_id: id,
                branch: branch.clone(),
                location,
            },
        );
        Ok(id)
    }

    /// Store `content` as the next revision of `branch`.
    ///
    /// When the archive requires locks, the caller must hold the lock on the
    /// branch's default revision. A lock the caller holds there is released.
    pub fn checkin(
        &self,
        ctx: &RequestContext,
        id: FileId,
        branch: &BranchName,
        content: Vec<u8>,
        description: &str,
    ) -> Result<RevisionId, EngineError> {
        let compression = self.config().compression();
        let revision = self.mutate_archive(id, |archive, graph| {
            ensure_visible(archive, graph, branch)?;
            ensure_writable(graph, branch)?;
            let default = tree::resolve_default_revision(archive, graph, branch);
            let holds = locks::holder_of(archive, &default) == Some(&ctx.user);
            if archive.header().attributes.require_lock && !holds {
                return Err(EngineError::LockRequired {
                    file_id: id,
                    revision: default,
                });
            }

            let content = if expands_keywords(&archive.header().attributes) {
                keywords::contract(&content)
            } else {
                content
            };
            let placement = tree::checkin_placement(archive, graph, branch);
            let revision = archive.store_revision(
                placement,
                NewRevision {
                    content,
                    author: ctx.user.clone(),
                    timestamp: ctx.timestamp.clone(),
                    description: description.to_string(),
                },
                compression,
            )?;
            if !branch.is_trunk() {
                archive.header_mut().view_mut(branch).tip = Some(revision.clone());
            }
            if holds {
                locks::unlock(archive, &default, &ctx.user, UnlockBehavior::JustUnlock)?;
            }
            Ok(revision)
        })?;

        tracing::info!(file_id = %id, %branch, %revision, user = %ctx.user, "checked in");
        self.notify(
            ctx,
            Notification::CheckedIn {
                file_id: id,
                branch: branch.clone(),
                revision: revision.clone(),
            },
        );
        Ok(revision)
    }

    /// Read a revision's exact bytes.
    ///
    /// [`RevisionSelector::Default`] requires the archive to be visible on
    /// `branch`; explicit revisions and labels do not.
    pub fn fetch(
        &self,
        id: FileId,
        branch: &BranchName,
        selector: &RevisionSelector,
    ) -> Result<(RevisionId, Vec<u8>), EngineError> {
        self.read_archive(id, |archive, graph| {
            let revision = match selector {
                RevisionSelector::Default => {
                    ensure_visible(archive, graph, branch)?;
                    tree::resolve_default_revision(archive, graph, branch)
                }
                RevisionSelector::Revision(revision) => revision.clone(),
                RevisionSelector::Label(name) => tree::resolve_label(archive, name)?,
            };
            let content = archive.fetch_revision(&revision)?;
            Ok((revision, content))
        })
    }

    /// Read a revision as a working copy: like [`Project::fetch`], with
    /// keywords expanded when the archive asks for it.
    pub fn fetch_workfile(
        &self,
        id: FileId,
        branch: &BranchName,
        selector: &RevisionSelector,
    ) -> Result<(RevisionId, Vec<u8>), EngineError> {
        let (revision, content) = self.fetch(id, branch, selector)?;
        let project = self
            .paths()
            .root()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.read_archive(id, |archive, graph| {
            if !expands_keywords(&archive.header().attributes) {
                return Ok((revision, content));
            }
            let values = keyword_values(archive, graph, branch, &revision, &project);
            Ok((revision, keywords::expand(&content, &values)))
        })
    }

    /// Rename the file on `branch` (and branches that inherit its location).
    pub fn rename(
        &self,
        ctx: &RequestContext,
        id: FileId,
        branch: &BranchName,
        new_name: &str,
    ) -> Result<ArchiveLocation, EngineError> {
        self.relocate(ctx, id, branch, |from| from.renamed(new_name))
    }

    /// Move the file to another directory on `branch`.
    pub fn move_file(
        &self,
        ctx: &RequestContext,
        id: FileId,
        branch: &BranchName,
        new_dir: &str,
    ) -> Result<ArchiveLocation, EngineError> {
        self.relocate(ctx, id, branch, |from| from.moved(new_dir))
    }

    fn relocate(
        &self,
        ctx: &RequestContext,
        id: FileId,
        branch: &BranchName,
        change: impl FnOnce(&ArchiveLocation) -> Result<ArchiveLocation, TypeError>,
    ) -> Result<ArchiveLocation, EngineError> {
        let namespace = self.namespace();
        let taken = self.others_on(branch, id);
        let (from, to) = self.mutate_archive(id, |archive, graph| {
            ensure_visible(archive, graph, branch)?;
            ensure_writable(graph, branch)?;
            let from = tree::resolve_location(archive, graph, branch);
            let to = change(&from)?;
            if to.is_reserved() {
                return Err(EngineError::ReservedLocation(to));
            }
            if taken.contains(&to) {
                return Err(EngineError::AlreadyControlled {
                    location: to,
                    branch: branch.clone(),
                });
            }
            if to == from {
                return Ok((from, to));
            }

            if branch.is_trunk() {
                let header = archive.header_mut();
                header.home = to.clone();
                header.view_mut(branch).location = None;
            } else {
                let inherited = tree::inherited_location(archive, graph, branch);
                archive.header_mut().view_mut(branch).location =
                    (inherited != to).then(|| to.clone());
            }
            archive.header_mut().prune_views();
            Ok((from, to))
        })?;
        drop(namespace);

        if from != to {
            tracing::info!(file_id = %id, %branch, %from, %to, user = %ctx.user, "archive relocated");
            self.notify(
                ctx,
                Notification::Renamed {
                    file_id: id,
                    branch: branch.clone(),
                    from,
                    to: to.clone(),
                },
            );
        }
        Ok(to)
    }

    /// Delete the file on `branch`.
    ///
    /// On trunk the archive moves to the cemetery; on other branches it is
    /// flagged deleted for that branch and its descendants.
    ///
    /// # Errors
    ///
    /// [`EngineError::Locked`] while any revision is locked.
    pub fn delete(
        &self,
        ctx: &RequestContext,
        id: FileId,
        branch: &BranchName,
    ) -> Result<(), EngineError> {
        self.mutate_archive(id, |archive, graph| {
            ensure_visible(archive, graph, branch)?;
            ensure_writable(graph, branch)?;
            if locks::is_locked(archive) {
                return Err(EngineError::Locked(id));
            }
            if branch.is_trunk() {
                archive.enter_cemetery(ctx.user.clone(), ctx.timestamp.clone());
            } else {
                archive.header_mut().view_mut(branch).deleted = true;
            }
            Ok(())
        })?;

        tracing::info!(file_id = %id, %branch, user = %ctx.user, "archive deleted");
        self.notify(
            ctx,
            Notification::Deleted {
                file_id: id,
                branch: branch.clone(),
            },
        );
        Ok(())
    }

    /// Reverse a delete on `branch`.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotDeleted`] when `branch` did not delete the file,
    /// [`EngineError::AlreadyControlled`] when another archive now occupies
    /// the original location on trunk, [`EngineError::Locked`] while any
    /// revision is locked.
    pub fn undelete(
        &self,
        ctx: &RequestContext,
        id: FileId,
        branch: &BranchName,
    ) -> Result<ArchiveLocation, EngineError> {
        let namespace = self.namespace();
        let taken = self.others_on(branch, id);
        let location = self.mutate_archive(id, |archive, graph| {
            graph.require(branch)?;
            ensure_writable(graph, branch)?;
            if locks::is_locked(archive) {
                return Err(EngineError::Locked(id));
            }
            let not_deleted = || EngineError::NotDeleted {
                file_id: id,
                branch: branch.clone(),
            };

            if branch.is_trunk() {
                let original = archive
                    .header()
                    .cemetery
                    .as_ref()
                    .map(|c| c.original_location.clone())
                    .ok_or_else(not_deleted)?;
                if taken.contains(&original) {
                    return Err(EngineError::AlreadyControlled {
                        location: original,
                        branch: branch.clone(),
                    });
                }
                archive.leave_cemetery();
            } else {
                if !archive.header().view(branch).is_some_and(|v| v.deleted) {
                    return Err(not_deleted());
                }
                archive.header_mut().view_mut(branch).deleted = false;
                archive.header_mut().prune_views();
            }
            Ok(tree::resolve_location(archive, graph, branch))
        })?;
        drop(namespace);

        tracing::info!(file_id = %id, %branch, %location, user = %ctx.user, "archive restored");
        self.notify(
            ctx,
            Notification::Undeleted {
                file_id: id,
                branch: branch.clone(),
            },
        );
        Ok(location)
    }

    /// Replace the archive's attributes.
    pub fn set_attributes(
        &self,
        ctx: &RequestContext,
        id: FileId,
        attributes: Attributes,
    ) -> Result<(), EngineError> {
        self.mutate_archive(id, |archive, _| {
            if archive.header().attributes != attributes {
                archive.header_mut().attributes = attributes;
            }
            Ok(())
        })?;
        self.notify(ctx, Notification::AttributesChanged { file_id: id });
        Ok(())
    }

    /// Every revision of the archive, trunk lineage first.
    pub fn history(&self, id: FileId) -> Result<Vec<RevisionSummary>, EngineError> {
        self.read_archive(id, |archive, _| Ok(tree::history(archive)))
    }

    /// Archive deleted on `branch` whose location there was `location`.
    ///
    /// On trunk this searches the cemetery by original location.
    pub fn find_deleted(&self, branch: &BranchName, location: &ArchiveLocation) -> Option<FileId> {
        self.archive_ids().into_iter().find(|id| {
            self.read_archive(*id, |archive, graph| {
                let header = archive.header();
                Ok(if branch.is_trunk() {
                    header
                        .cemetery
                        .as_ref()
                        .is_some_and(|c| &c.original_location == location)
                } else {
                    header.cemetery.is_none()
                        && header.view(branch).is_some_and(|v| v.deleted)
                        && &tree::resolve_location(archive, graph, branch) == location
                })
            })
            .unwrap_or(false)
        })
    }

    /// Whether the archive contains `revision`.
    pub fn has_revision(&self, id: FileId, revision: &RevisionId) -> Result<bool, EngineError> {
        self.read_archive(id, |archive, _| Ok(archive.contains(revision)))
    }
}
