//! core::ops::lock
//!
//! Exclusive project ownership lock.
//!
//! # Architecture
//!
//! Exactly one serving process owns a project at a time. Ownership is an
//! OS-level exclusive lock on `<root>/lock` taken when the project is opened
//! and held for the lifetime of the [`Project`](crate::engine::Project).
//! Concurrency between caller threads inside the owning process is handled
//! by per-archive exclusive sections, not by this lock.
//!
//! # Invariants
//!
//! - Lock is automatically released on drop (RAII pattern)
//! - Lock acquisition is non-blocking (fails fast if owned elsewhere)
//!
//! # Example
//!
//! ```ignore
//! use branchvault::core::ops::lock::ProjectLock;
//! use branchvault::core::paths::ProjectPaths;
//!
//! let paths = ProjectPaths::new("/srv/vault/web".into());
//! let lock = ProjectLock::acquire(&paths)?;
//! // lock released on drop
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::ProjectPaths;

/// Errors from project ownership locking.
#[derive(Debug, Error)]
pub enum ProjectLockError {
    /// Another process owns the project.
    #[error("project is owned by another process")]
    AlreadyLocked,

    /// Failed to create the lock file or its directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// Exclusive ownership of a project directory.
#[derive(Debug)]
pub struct ProjectLock {
    path: PathBuf,
    /// Open handle while the lock is held.
    file: Option<File>,
}

impl ProjectLock {
    /// Take ownership of the project.
    ///
    /// # Errors
    ///
    /// - [`ProjectLockError::AlreadyLocked`] if another process owns it
    /// - [`ProjectLockError::CreateFailed`] if the lock file cannot be created
    /// - [`ProjectLockError::AcquireFailed`] if the OS lock cannot be taken
    pub fn acquire(paths: &ProjectPaths) -> Result<Self, ProjectLockError> {
        fs::create_dir_all(paths.root()).map_err(|e| {
            ProjectLockError::CreateFailed(format!(
                "cannot create {}: {}",
                paths.root().display(),
                e
            ))
        })?;

        let path = paths.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                ProjectLockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "project lock acquired");
                Ok(Self {
                    path,
                    file: Some(file),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                Err(ProjectLockError::AlreadyLocked)
            }
            Err(e) => Err(ProjectLockError::AcquireFailed(e.to_string())),
        }
    }

    /// Try to take ownership, returning `None` if another process has it.
    pub fn try_acquire(paths: &ProjectPaths) -> Result<Option<Self>, ProjectLockError> {
        match Self::acquire(paths) {
            Ok(lock) => Ok(Some(lock)),
            Err(ProjectLockError::AlreadyLocked) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Whether this guard still holds the lock.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release ownership early. Calling twice is harmless.
    pub fn release(&mut self) -> Result<(), ProjectLockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| ProjectLockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_paths(dir: &Path) -> ProjectPaths {
        ProjectPaths::new(dir.join("proj"))
    }

    #[test]
    fn acquire_creates_root_and_lock_file() {
        let temp = TempDir::new().expect("create temp dir");
        let paths = test_paths(temp.path());

        let lock = ProjectLock::acquire(&paths).expect("acquire lock");
        assert!(lock.is_held());
        assert_eq!(lock.path(), paths.lock_path());
        assert!(paths.lock_path().exists());
    }

    #[test]
    fn second_acquire_is_refused() {
        let temp = TempDir::new().expect("create temp dir");
        let paths = test_paths(temp.path());

        let _lock = ProjectLock::acquire(&paths).expect("first acquire");
        assert!(matches!(
            ProjectLock::acquire(&paths),
            Err(ProjectLockError::AlreadyLocked)
        ));
        assert!(ProjectLock::try_acquire(&paths)
            .expect("try_acquire")
            .is_none());
    }

    #[test]
    fn released_on_drop() {
        let temp = TempDir::new().expect("create temp dir");
        let paths = test_paths(temp.path());

        {
            let _lock = ProjectLock::acquire(&paths).expect("first acquire");
        }

        let lock = ProjectLock::acquire(&paths).expect("second acquire");
        assert!(lock.is_held());
    }

    #[test]
    fn explicit_release_is_idempotent() {
        let temp = TempDir::new().expect("create temp dir");
        let paths = test_paths(temp.path());

        let mut lock = ProjectLock::acquire(&paths).expect("acquire");
        lock.release().expect("first release");
        lock.release().expect("second release");
        assert!(!lock.is_held());

        let again = ProjectLock::try_acquire(&paths)
            .expect("try_acquire")
            .expect("should get lock");
        assert!(again.is_held());
    }
}
