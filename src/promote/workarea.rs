//! promote::workarea

use std::path::PathBuf;

use crate::core::types::{ArchiveLocation, BranchName};

/// Answers whether a working copy exists at a location on a branch.
///
/// The engine only asks; it never reads or writes working files.
pub trait WorkArea {
    fn contains(&self, branch: &BranchName, location: &ArchiveLocation) -> bool;
}

/// No working directories at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWorkArea;

impl WorkArea for NoWorkArea {
    fn contains(&self, _branch: &BranchName, _location: &ArchiveLocation) -> bool {
        false
    }
}

/// A single working directory checked out for one branch.
#[derive(Debug, Clone)]
pub struct DirWorkArea {
    root: PathBuf,
    branch: BranchName,
}

impl DirWorkArea {
    pub fn new(root: impl Into<PathBuf>, branch: BranchName) -> Self {
        Self {
            root: root.into(),
            branch,
        }
    }

    /// Filesystem path of `location` inside this directory.
    pub fn path_of(&self, location: &ArchiveLocation) -> PathBuf {
        let mut path = self.root.clone();
        for part in location.appended_path().split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        path.push(location.short_name());
        path
    }
}

impl WorkArea for DirWorkArea {
    fn contains(&self, branch: &BranchName, location: &ArchiveLocation) -> bool {
        branch == &self.branch && self.path_of(location).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn dir_work_area_checks_branch_and_file() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("docs")).unwrap();
        std::fs::write(temp.path().join("docs/a.md"), "x").unwrap();

        let area = DirWorkArea::new(temp.path(), BranchName::trunk());
        let present = ArchiveLocation::new("docs", "a.md").unwrap();
        let absent = ArchiveLocation::new("docs", "b.md").unwrap();

        assert!(area.contains(&BranchName::trunk(), &present));
        assert!(!area.contains(&BranchName::trunk(), &absent));
        assert!(!area.contains(&BranchName::new("dev").unwrap(), &present));
        assert!(!NoWorkArea.contains(&BranchName::trunk(), &present));
    }
}
