//! archive::store
//!
//! Durable archive files.
//!
//! # Architecture
//!
//! Each archive is one file, `archives/<file-id>.bva` while live or
//! `cemetery/<file-id>.bva` while deleted. A commit rewrites the whole file
//! through [`durable::write_atomic`], so a failed commit leaves the previous
//! file intact. Moving between the two directories writes the new copy
//! first and removes the old one second; if both copies exist after a crash,
//! the one with the later commit id wins on load.
//!
//! Commit ids count per archive. Each commit stores one more than the id the
//! archive was loaded with, so the sequence continues across processes.

use std::fs;
use std::path::Path;

use super::format;
use super::model::Archive;
use super::ArchiveError;
use crate::core::ops::durable;
use crate::core::paths::{ProjectPaths, ARCHIVE_EXTENSION};
use crate::core::types::FileId;

/// Reads and writes archive files for one project.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    paths: ProjectPaths,
}

impl ArchiveStore {
    pub fn new(paths: ProjectPaths) -> Self {
        Self { paths }
    }

    /// Load an archive from the live or cemetery directory.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::NotFound`] when neither file exists, I/O and decode
    /// failures otherwise.
    pub fn load(&self, id: FileId) -> Result<Archive, ArchiveError> {
        let live = self.read_if_exists(id, &self.paths.archive_path(&id))?;
        let buried = self.read_if_exists(id, &self.paths.buried_path(&id))?;

        match (live, buried) {
            (Some(a), Some(b)) => {
                tracing::warn!(file_id = %id, "archive present in both live and cemetery directories");
                if b.header().last_commit > a.header().last_commit {
                    Ok(b)
                } else {
                    Ok(a)
                }
            }
            (Some(a), None) | (None, Some(a)) => Ok(a),
            (None, None) => Err(ArchiveError::NotFound(id)),
        }
    }

    fn read_if_exists(&self, id: FileId, path: &Path) -> Result<Option<Archive>, ArchiveError> {
        match fs::read(path) {
            Ok(bytes) => format::decode(id, &bytes).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ArchiveError::Io {
                file_id: id,
                op: "read",
                source,
            }),
        }
    }

    /// Ids of every archive on disk, live and buried.
    pub fn list(&self) -> Result<Vec<FileId>, ArchiveError> {
        let mut ids = self.scan(&self.paths.archives_dir())?;
        ids.extend(self.scan(&self.paths.cemetery_dir())?);
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn scan(&self, dir: &Path) -> Result<Vec<FileId>, ArchiveError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ArchiveError::Scan(e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry.map_err(ArchiveError::Scan)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ARCHIVE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match FileId::parse(stem) {
                Ok(id) => ids.push(id),
                Err(_) => tracing::debug!(path = %path.display(), "skipping unrecognized file"),
            }
        }
        Ok(ids)
    }

    /// Write the archive durably and mark it clean.
    ///
    /// The file goes to the cemetery directory when the header carries a
    /// cemetery record, otherwise to the live directory. Any copy left in the
    /// other directory is removed after the write succeeds.
    ///
    /// # Errors
    ///
    /// Encoding or I/O failure. The previous file and the in-memory commit
    /// id are unchanged. Failing to remove the stale copy is only logged.
    pub fn commit(&self, archive: &mut Archive) -> Result<u64, ArchiveError> {
        let id = archive.file_id();
        let previous = archive.header().last_commit;
        let commit_id = previous.map_or(1, |c| c + 1);
        archive.header_mut().last_commit = Some(commit_id);

        let result = format::encode(archive).and_then(|bytes| {
            durable::write_atomic(&self.target_path(archive), &bytes).map_err(|source| {
                ArchiveError::Io {
                    file_id: id,
                    op: "commit",
                    source,
                }
            })
        });

        match result {
            Ok(()) => {
                archive.mark_clean();
                tracing::debug!(file_id = %id, commit = commit_id, "archive committed");
            }
            Err(e) => {
                archive.header_mut().last_commit = previous;
                return Err(e);
            }
        }

        let stale = if archive.is_buried() {
            self.paths.archive_path(&id)
        } else {
            self.paths.buried_path(&id)
        };
        self.remove_stale(id, &stale);
        Ok(commit_id)
    }

    fn target_path(&self, archive: &Archive) -> std::path::PathBuf {
        let id = archive.file_id();
        if archive.header().cemetery.is_some() {
            self.paths.buried_path(&id)
        } else {
            self.paths.archive_path(&id)
        }
    }

    // The new copy is already durable and wins on load.
    fn remove_stale(&self, id: FileId, path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                file_id = %id,
                path = %path.display(),
                error = %e,
                "could not remove stale archive copy"
            ),
        }
    }
}
