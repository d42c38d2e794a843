//! locks::registry
//!
//! Process-local index of lock records across archives.

use dashmap::DashMap;

use crate::archive::{Archive, LockRecord};
use crate::core::types::{FileId, RevisionId, UserName};

/// In-memory view of every archive's lock table.
///
/// Owned by a `Project`; refreshed from the archive header after each
/// committed lock change.
#[derive(Debug, Default)]
pub struct LockRegistry {
    by_archive: DashMap<FileId, Vec<LockRecord>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from archive headers.
    pub fn rebuild<'a>(&self, archives: impl IntoIterator<Item = &'a Archive>) {
        self.by_archive.clear();
        for archive in archives {
            self.sync(archive);
        }
    }

    /// Refresh one archive's entry from its header.
    pub fn sync(&self, archive: &Archive) {
        let locks = &archive.header().locks;
        if locks.is_empty() {
            self.by_archive.remove(&archive.file_id());
        } else {
            self.by_archive.insert(archive.file_id(), locks.clone());
        }
    }

    pub fn holder_of(&self, file_id: &FileId, revision: &RevisionId) -> Option<UserName> {
        self.by_archive.get(file_id).and_then(|locks| {
            locks
                .iter()
                .find(|l| &l.revision == revision)
                .map(|l| l.holder.clone())
        })
    }

    /// Locks on one archive.
    pub fn locks_for(&self, file_id: &FileId) -> Vec<LockRecord> {
        self.by_archive
            .get(file_id)
            .map(|locks| locks.clone())
            .unwrap_or_default()
    }

    /// Every lock `user` holds, ordered by archive then revision.
    pub fn locks_held_by(&self, user: &UserName) -> Vec<(FileId, LockRecord)> {
        let mut held: Vec<(FileId, LockRecord)> = self
            .by_archive
            .iter()
            .flat_map(|entry| {
                let id = *entry.key();
                entry
                    .value()
                    .iter()
                    .filter(|l| &l.holder == user)
                    .map(move |l| (id, l.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        held.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.revision.cmp(&b.1.revision)));
        held
    }

    /// Total number of locks held.
    pub fn lock_count(&self) -> usize {
        self.by_archive.iter().map(|e| e.value().len()).sum()
    }
}
