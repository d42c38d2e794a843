//! archive::model
//!
//! In-memory archive: header plus revision index.
//!
//! # Invariants
//!
//! - The newest revision of every lineage (its tip) has a `Full` body
//! - Every other revision has a `ReverseDelta` body against its successor
//!   on the same lineage
//! - Mutations only touch memory and set the dirty flag; durable state
//!   changes only through [`ArchiveStore::commit`](super::ArchiveStore::commit)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ArchiveError;
use crate::codec::{self, CompressionKind};
use crate::core::types::{
    ArchiveLocation, BranchName, ContentDigest, FileId, RevisionId, UserName, UtcTimestamp,
    CEMETERY_DIR,
};

/// Version of the header layout written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Per-archive behavior switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// Content is binary: never line-merged.
    pub binary: bool,
    /// Text is stored with keywords contracted and expanded in working copies.
    pub expand_keywords: bool,
    /// Checkin requires the caller to hold a lock.
    pub require_lock: bool,
    /// Stored bodies may be compressed.
    pub compress: bool,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            binary: false,
            expand_keywords: false,
            require_lock: false,
            compress: true,
        }
    }
}

/// Branch-scoped view of an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchView {
    /// The branch's own tip. `None` means the branch follows its parent.
    pub tip: Option<RevisionId>,
    /// Location override on this branch and its descendants.
    pub location: Option<ArchiveLocation>,
    /// Deleted on this branch and its descendants.
    pub deleted: bool,
}

impl BranchView {
    pub fn is_empty(&self) -> bool {
        self.tip.is_none() && self.location.is_none() && !self.deleted
    }
}

/// A named pointer at a revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub revision: RevisionId,
    /// Follows the tip of the revision's lineage.
    pub floating: bool,
    pub created_by: UserName,
    pub created_at: UtcTimestamp,
}

/// A lock held on one revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub revision: RevisionId,
    pub holder: UserName,
    pub branch: BranchName,
    pub locked_at: UtcTimestamp,
}

/// Set while the archive is in the cemetery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CemeteryRecord {
    pub deleted_by: UserName,
    pub deleted_at: UtcTimestamp,
    pub original_location: ArchiveLocation,
}

/// One completed promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionRecord {
    pub source_branch: BranchName,
    pub target_branch: BranchName,
    pub source_revision: RevisionId,
    pub user: UserName,
    pub at: UtcTimestamp,
}

/// Archive-wide metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveHeader {
    pub format_version: u32,
    pub file_id: FileId,
    pub attributes: Attributes,
    pub description: String,
    /// Location on trunk (and every branch without an override).
    pub home: ArchiveLocation,
    /// Branch the archive was created on; `None` once visible from trunk.
    pub origin: Option<BranchName>,
    pub created_by: UserName,
    pub created_at: UtcTimestamp,
    pub views: BTreeMap<BranchName, BranchView>,
    pub labels: Vec<Label>,
    pub locks: Vec<LockRecord>,
    pub cemetery: Option<CemeteryRecord>,
    pub promotions: Vec<PromotionRecord>,
    /// Sequence number of the last durable commit of this archive.
    pub last_commit: Option<u64>,
}

impl ArchiveHeader {
    /// The view for `branch`, if one was ever recorded.
    pub fn view(&self, branch: &BranchName) -> Option<&BranchView> {
        self.views.get(branch)
    }

    /// The view for `branch`, created empty on demand.
    pub fn view_mut(&mut self, branch: &BranchName) -> &mut BranchView {
        self.views.entry(branch.clone()).or_default()
    }

    /// Drop views that no longer carry anything.
    pub fn prune_views(&mut self) {
        self.views.retain(|_, v| !v.is_empty());
    }
}

/// Stored body of a revision, compressed per [`RevisionEntry::compression`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevisionBody {
    Full(Vec<u8>),
    ReverseDelta(Vec<u8>),
}

/// One stored revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionEntry {
    pub id: RevisionId,
    pub author: UserName,
    pub timestamp: UtcTimestamp,
    pub description: String,
    pub compression: CompressionKind,
    pub body: RevisionBody,
    pub digest: ContentDigest,
    pub size: u64,
}

/// Content and metadata for a revision about to be stored.
#[derive(Debug, Clone)]
pub struct NewRevision {
    pub content: Vec<u8>,
    pub author: UserName,
    pub timestamp: UtcTimestamp,
    pub description: String,
}

/// Where a new revision goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Append after this revision, which must be its lineage's tip.
    Extend(RevisionId),
    /// Start a new lineage forked at this revision.
    Fork(RevisionId),
}

/// A version-controlled file: header plus revisions.
#[derive(Debug, Clone)]
pub struct Archive {
    header: ArchiveHeader,
    revisions: BTreeMap<RevisionId, RevisionEntry>,
    dirty: bool,
}

impl Archive {
    /// Create an archive whose first revision is `1.1`.
    pub fn create(
        home: ArchiveLocation,
        origin: Option<BranchName>,
        attributes: Attributes,
        description: impl Into<String>,
        first: NewRevision,
        compression: CompressionKind,
    ) -> Self {
        let file_id = FileId::generate();
        let root = RevisionId::root();
        let compression = if attributes.compress {
            compression
        } else {
            CompressionKind::None
        };
        let mut header = ArchiveHeader {
            format_version: FORMAT_VERSION,
            file_id,
            attributes,
            description: description.into(),
            home,
            origin: origin.clone(),
            created_by: first.author.clone(),
            created_at: first.timestamp.clone(),
            views: BTreeMap::new(),
            labels: Vec::new(),
            locks: Vec::new(),
            cemetery: None,
            promotions: Vec::new(),
            last_commit: None,
        };
        if let Some(branch) = origin {
            header.view_mut(&branch).tip = Some(root.clone());
        }

        let mut archive = Self {
            header,
            revisions: BTreeMap::new(),
            dirty: true,
        };
        let entry = archive.full_entry(root.clone(), first, compression);
        archive.revisions.insert(root, entry);
        archive
    }

    pub(crate) fn from_parts(header: ArchiveHeader, revisions: Vec<RevisionEntry>) -> Self {
        Self {
            header,
            revisions: revisions.into_iter().map(|r| (r.id.clone(), r)).collect(),
            dirty: false,
        }
    }

    pub(crate) fn revisions_vec(&self) -> Vec<RevisionEntry> {
        self.revisions.values().cloned().collect()
    }

    pub fn file_id(&self) -> FileId {
        self.header.file_id
    }

    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Mutable header access; marks the archive dirty.
    pub fn header_mut(&mut self) -> &mut ArchiveHeader {
        self.dirty = true;
        &mut self.header
    }

    /// Whether in-memory changes await a commit.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn contains(&self, id: &RevisionId) -> bool {
        self.revisions.contains_key(id)
    }

    pub fn revision(&self, id: &RevisionId) -> Option<&RevisionEntry> {
        self.revisions.get(id)
    }

    /// All revisions in id order.
    pub fn revisions(&self) -> impl Iterator<Item = &RevisionEntry> {
        self.revisions.values()
    }

    pub fn revision_count(&self) -> usize {
        self.revisions.len()
    }

    /// Newest revision on the lineage `id` belongs to.
    pub fn lineage_tip(&self, id: &RevisionId) -> Option<&RevisionId> {
        self.revisions
            .keys()
            .filter(|r| r.same_lineage(id))
            .max_by_key(|r| r.minor())
    }

    /// Newest trunk-spine revision.
    pub fn trunk_tip(&self) -> RevisionId {
        self.revisions
            .keys()
            .filter(|r| r.depth() == 0)
            .max_by_key(|r| r.minor())
            .cloned()
            .unwrap_or_else(RevisionId::root)
    }

    /// Whether the archive is in the cemetery.
    pub fn is_buried(&self) -> bool {
        self.header.cemetery.is_some()
    }

    /// Move the archive into the cemetery, in memory.
    ///
    /// Home becomes `<cemetery>/<file-id>-<short name>` so the original
    /// location is free for new files. No-op if already buried.
    pub fn enter_cemetery(&mut self, deleted_by: UserName, deleted_at: UtcTimestamp) {
        if self.is_buried() {
            return;
        }
        let original = self.header.home.clone();
        let buried = ArchiveLocation::new(
            CEMETERY_DIR,
            format!("{}-{}", self.file_id(), original.short_name()),
        )
        .unwrap_or_else(|_| original.clone());
        self.header.home = buried;
        self.header.cemetery = Some(CemeteryRecord {
            deleted_by,
            deleted_at,
            original_location: original,
        });
        self.dirty = true;
    }

    /// Bring the archive back to its original home, in memory.
    pub fn leave_cemetery(&mut self) -> Option<CemeteryRecord> {
        let record = self.header.cemetery.take()?;
        self.header.home = record.original_location.clone();
        self.dirty = true;
        Some(record)
    }

    /// Highest branch number already forked at `base`.
    fn max_branch_number_at(&self, base: &RevisionId) -> u32 {
        self.revisions
            .keys()
            .filter(|r| r.fork_point().as_ref() == Some(base))
            .filter_map(RevisionId::branch_number)
            .max()
            .unwrap_or(0)
    }

    /// Reconstruct the exact bytes of `id`.
    ///
    /// Expands the lineage tip, then applies reverse deltas back to `id` and
    /// checks the result against the stored digest.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::RevisionNotFound`] if absent, [`ArchiveError::Corrupt`]
    /// on any decode failure or digest mismatch.
    pub fn fetch_revision(&self, id: &RevisionId) -> Result<Vec<u8>, ArchiveError> {
        let target = self
            .revisions
            .get(id)
            .ok_or_else(|| ArchiveError::RevisionNotFound {
                file_id: self.file_id(),
                revision: id.clone(),
            })?;
        let tip_id = self
            .lineage_tip(id)
            .cloned()
            .unwrap_or_else(|| id.clone());

        let mut current = tip_id.clone();
        let mut content = match &self.entry(&current)?.body {
            RevisionBody::Full(bytes) => self.expand(&current, bytes)?,
            RevisionBody::ReverseDelta(_) => {
                return Err(self.corrupt(&current, "lineage tip is not stored in full"))
            }
        };

        while &current != id {
            let prior = current
                .parent()
                .filter(|p| p.same_lineage(&current))
                .ok_or_else(|| self.corrupt(&current, "broken lineage chain"))?;
            let entry = self.entry(&prior)?;
            let script = match &entry.body {
                RevisionBody::ReverseDelta(bytes) => self.expand(&prior, bytes)?,
                RevisionBody::Full(_) => {
                    return Err(self.corrupt(&prior, "non-tip revision stored in full"))
                }
            };
            content = codec::apply_reverse_delta(&content, &script)
                .map_err(|e| self.corrupt(&prior, e))?;
            current = prior;
        }

        if ContentDigest::of(&content) != target.digest || content.len() as u64 != target.size {
            return Err(self.corrupt(id, "content digest mismatch"));
        }
        Ok(content)
    }

    /// Add a revision in memory and return its id.
    ///
    /// On `Extend`, the old tip becomes a reverse delta against the new tip
    /// and floating labels on it move to the new tip. On `Fork`, the new
    /// revision opens lineage `k` at the base where `k` is one past the
    /// highest branch number already forked there.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::StaleTip`] if an `Extend` target is not its lineage
    /// tip, [`ArchiveError::RevisionNotFound`] for an unknown base, and any
    /// reconstruction error for the old tip.
    pub fn store_revision(
        &mut self,
        placement: Placement,
        revision: NewRevision,
        compression: CompressionKind,
    ) -> Result<RevisionId, ArchiveError> {
        let compression = if self.header.attributes.compress {
            compression
        } else {
            CompressionKind::None
        };

        match placement {
            Placement::Extend(tip) => {
                let actual = self.lineage_tip(&tip).cloned();
                if actual.as_ref() != Some(&tip) {
                    return Err(ArchiveError::StaleTip {
                        file_id: self.file_id(),
                        expected: tip,
                        actual,
                    });
                }

                let old_content = self.fetch_revision(&tip)?;
                let script = codec::reverse_delta(&revision.content, &old_content);
                let (kind, packed) = codec::compress_best(compression, &script);

                let new_id = tip.next();
                let entry = self.full_entry(new_id.clone(), revision, compression);

                if let Some(old) = self.revisions.get_mut(&tip) {
                    old.compression = kind;
                    old.body = RevisionBody::ReverseDelta(packed);
                }
                self.revisions.insert(new_id.clone(), entry);

                for label in self.header.labels.iter_mut() {
                    if label.floating && label.revision == tip {
                        label.revision = new_id.clone();
                    }
                }
                self.dirty = true;
                Ok(new_id)
            }
            Placement::Fork(base) => {
                if !self.contains(&base) {
                    return Err(ArchiveError::RevisionNotFound {
                        file_id: self.file_id(),
                        revision: base,
                    });
                }
                let new_id = base.fork(self.max_branch_number_at(&base) + 1);
                let entry = self.full_entry(new_id.clone(), revision, compression);
                self.revisions.insert(new_id.clone(), entry);
                self.dirty = true;
                Ok(new_id)
            }
        }
    }

    fn full_entry(
        &self,
        id: RevisionId,
        revision: NewRevision,
        compression: CompressionKind,
    ) -> RevisionEntry {
        let (kind, packed) = codec::compress_best(compression, &revision.content);
        RevisionEntry {
            id,
            author: revision.author,
            timestamp: revision.timestamp,
            description: revision.description,
            compression: kind,
            body: RevisionBody::Full(packed),
            digest: ContentDigest::of(&revision.content),
            size: revision.content.len() as u64,
        }
    }

    fn entry(&self, id: &RevisionId) -> Result<&RevisionEntry, ArchiveError> {
        self.revisions
            .get(id)
            .ok_or_else(|| self.corrupt(id, "revision missing from lineage"))
    }

    fn expand(&self, id: &RevisionId, bytes: &[u8]) -> Result<Vec<u8>, ArchiveError> {
        let kind = self.entry(id)?.compression;
        codec::expand(kind, bytes).map_err(|e| self.corrupt(id, e))
    }

    fn corrupt(&self, id: &RevisionId, detail: impl std::fmt::Display) -> ArchiveError {
        ArchiveError::Corrupt {
            file_id: self.file_id(),
            detail: format!("revision {id}: {detail}"),
        }
    }
}
