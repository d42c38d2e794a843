//! core::paths
//!
//! Centralized path routing for project storage locations.
//!
//! # Architecture
//!
//! Every file the engine touches lives under a single project root. All
//! storage locations are computed here so no other module joins path
//! components by hand.
//!
//! # Storage Layout
//!
//! - `config.toml` - Project configuration
//! - `lock` - Exclusive ownership lock file
//! - `branches.json` - Branch graph
//! - `archives/<file-id>.bva` - Live archives
//! - `cemetery/<file-id>.bva` - Deleted archives
//!
//! # Example
//!
//! ```
//! use branchvault::core::paths::ProjectPaths;
//! use std::path::PathBuf;
//!
//! let paths = ProjectPaths::new(PathBuf::from("/srv/vault/web"));
//!
//! assert_eq!(
//!     paths.config_path(),
//!     PathBuf::from("/srv/vault/web/config.toml")
//! );
//! ```

use std::path::{Path, PathBuf};

use crate::core::types::FileId;

/// File extension of archive images.
pub const ARCHIVE_EXTENSION: &str = "bva";

/// Centralized path routing for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    /// Create paths for the project rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Project name (final component of the root).
    pub fn project_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string())
    }

    /// Path to the project configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Path to the ownership lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.root.join("lock")
    }

    /// Path to the persisted branch graph.
    pub fn branches_path(&self) -> PathBuf {
        self.root.join("branches.json")
    }

    /// Directory of live archives.
    pub fn archives_dir(&self) -> PathBuf {
        self.root.join("archives")
    }

    /// Directory of deleted archives.
    pub fn cemetery_dir(&self) -> PathBuf {
        self.root.join("cemetery")
    }

    /// Path of a live archive image.
    pub fn archive_path(&self, id: &FileId) -> PathBuf {
        self.archives_dir()
            .join(format!("{id}.{ARCHIVE_EXTENSION}"))
    }

    /// Path of a buried archive image.
    pub fn buried_path(&self, id: &FileId) -> PathBuf {
        self.cemetery_dir()
            .join(format!("{id}.{ARCHIVE_EXTENSION}"))
    }

    /// Whether the root holds an initialized project.
    pub fn is_initialized(&self) -> bool {
        self.branches_path().is_file() && self.archives_dir().is_dir()
    }

    /// Ensure the project directory structure exists.
    ///
    /// # Errors
    ///
    /// Returns an IO error if directory creation fails.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.archives_dir())?;
        std::fs::create_dir_all(self.cemetery_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> ProjectPaths {
        ProjectPaths::new(PathBuf::from("/vault/proj"))
    }

    #[test]
    fn fixed_files_live_under_root() {
        let p = paths();
        assert_eq!(p.lock_path(), PathBuf::from("/vault/proj/lock"));
        assert_eq!(p.branches_path(), PathBuf::from("/vault/proj/branches.json"));
        assert_eq!(p.project_name(), "proj");
    }

    #[test]
    fn archive_and_cemetery_paths_share_file_name() {
        let p = paths();
        let id = FileId::generate();
        let live = p.archive_path(&id);
        let buried = p.buried_path(&id);
        assert_eq!(live.file_name(), buried.file_name());
        assert!(live.starts_with("/vault/proj/archives"));
        assert!(buried.starts_with("/vault/proj/cemetery"));
        assert_eq!(live.extension().unwrap(), ARCHIVE_EXTENSION);
    }

    #[test]
    fn ensure_dirs_creates_layout() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let p = ProjectPaths::new(temp.path().join("proj"));
        assert!(!p.is_initialized());
        p.ensure_dirs().expect("ensure dirs");
        assert!(p.archives_dir().is_dir());
        assert!(p.cemetery_dir().is_dir());
        std::fs::write(p.branches_path(), "{}").expect("write");
        assert!(p.is_initialized());
    }
}
