//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated project branch name (`trunk` is the root)
//! - [`RevisionId`] - Dotted revision identifier encoding branch lineage
//! - [`FileId`] - Stable archive identity (survives rename, move, delete)
//! - [`UserName`] - Caller-supplied user identity
//! - [`ArchiveLocation`] - Appended path plus short workfile name
//! - [`ItemCoordinate`] - `{project, branch, appendedPath, shortName}` tuple
//! - [`UtcTimestamp`] - RFC3339 timestamp
//! - [`ContentDigest`] - SHA-256 of reconstructed revision content
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use branchvault::core::types::{BranchName, RevisionId};
//!
//! let branch = BranchName::new("release-2").unwrap();
//! let rev = RevisionId::new("1.3.1.2").unwrap();
//! assert_eq!(rev.depth(), 1);
//! assert_eq!(rev.parent().unwrap().to_string(), "1.3.1.1");
//!
//! assert!(BranchName::new("has space").is_err());
//! assert!(RevisionId::new("1.0").is_err());
//! # let _ = branch;
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// Name of the root branch every project has.
pub const TRUNK: &str = "trunk";

/// Reserved directory holding deleted archives.
pub const CEMETERY_DIR: &str = ".bv-cemetery";

/// Reserved directory holding archives that only exist on a branch.
pub const BRANCH_ARCHIVES_DIR: &str = ".bv-branch-archives";

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid revision id: {0}")]
    InvalidRevisionId(String),

    #[error("invalid file id: {0}")]
    InvalidFileId(String),

    #[error("invalid user name: {0}")]
    InvalidUserName(String),

    #[error("invalid archive location: {0}")]
    InvalidLocation(String),
}

/// A validated branch name.
///
/// Branch names must:
/// - Not be empty or longer than 128 bytes
/// - Not start with `.` or `-`
/// - Not contain whitespace, control characters, or any of `/ \ : * ? " < > |`
///
/// # Example
///
/// ```
/// use branchvault::core::types::BranchName;
///
/// let name = BranchName::new("feature-login").unwrap();
/// assert_eq!(name.as_str(), "feature-login");
/// assert!(BranchName::trunk().is_trunk());
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new(".hidden").is_err());
/// assert!(BranchName::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates the rules above.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// The root branch.
    pub fn trunk() -> Self {
        Self(TRUNK.to_string())
    }

    /// Whether this is the root branch.
    pub fn is_trunk(&self) -> bool {
        self.0 == TRUNK
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be empty".into(),
            ));
        }
        if name.len() > 128 {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot exceed 128 bytes".into(),
            ));
        }
        if name.starts_with('.') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '.'".into(),
            ));
        }
        if name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '-'".into(),
            ));
        }

        const INVALID_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{c}'"
                )));
            }
        }

        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot contain whitespace or control characters".into(),
            ));
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for BranchName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A dotted revision identifier.
///
/// The identifier is a sequence of `major.minor` pairs. Trunk revisions are
/// `1.N`. A branch lineage forked at revision `R` with branch number `k` holds
/// revisions `R.k.1`, `R.k.2`, ... The number of pairs minus one is the
/// branch depth.
///
/// Ordering is lexicographic over the pairs, so a fork point sorts before
/// every revision of the lineages forked from it.
///
/// # Example
///
/// ```
/// use branchvault::core::types::RevisionId;
///
/// let trunk = RevisionId::new("1.3").unwrap();
/// let branch = trunk.fork(1);
/// assert_eq!(branch.to_string(), "1.3.1.1");
/// assert_eq!(branch.parent(), Some(trunk.clone()));
/// assert_eq!(branch.next().to_string(), "1.3.1.2");
/// assert!(trunk.is_ancestor_of(&branch.next()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevisionId(Vec<(u32, u32)>);

impl RevisionId {
    /// Parse a dotted revision identifier.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRevisionId` unless the string is an even,
    /// non-zero number of positive integers separated by dots.
    pub fn new(id: impl AsRef<str>) -> Result<Self, TypeError> {
        let id = id.as_ref();
        let parts = id
            .split('.')
            .map(|p| {
                p.parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| TypeError::InvalidRevisionId(id.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if parts.is_empty() || parts.len() % 2 != 0 {
            return Err(TypeError::InvalidRevisionId(id.to_string()));
        }

        Ok(Self(parts.chunks(2).map(|c| (c[0], c[1])).collect()))
    }

    /// The first revision of every archive: `1.1`.
    pub fn root() -> Self {
        Self(vec![(1, 1)])
    }

    /// Branch depth: 0 for the trunk spine, `n` for a branch nested `n` deep.
    pub fn depth(&self) -> usize {
        self.0.len() - 1
    }

    /// Position of this revision within its lineage (the last minor number).
    pub fn minor(&self) -> u32 {
        self.last().1
    }

    /// The branch number of this revision's lineage, `None` on the trunk spine.
    pub fn branch_number(&self) -> Option<u32> {
        if self.depth() == 0 {
            None
        } else {
            Some(self.last().0)
        }
    }

    /// The revision this one was derived from.
    ///
    /// `x.M` derives from `x.(M-1)`; the first revision of a branch lineage
    /// derives from its fork point. The root has no parent.
    pub fn parent(&self) -> Option<Self> {
        let (major, minor) = self.last();
        if minor > 1 {
            let mut pairs = self.0.clone();
            let last = pairs.len() - 1;
            pairs[last] = (major, minor - 1);
            Some(Self(pairs))
        } else {
            self.fork_point()
        }
    }

    /// The revision this lineage was forked from, `None` on the trunk spine.
    pub fn fork_point(&self) -> Option<Self> {
        if self.depth() == 0 {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// The next revision on the same lineage.
    pub fn next(&self) -> Self {
        let mut pairs = self.0.clone();
        let last = pairs.len() - 1;
        pairs[last].1 += 1;
        Self(pairs)
    }

    /// The first revision of lineage `branch_number` forked at this revision.
    pub fn fork(&self, branch_number: u32) -> Self {
        let mut pairs = self.0.clone();
        pairs.push((branch_number, 1));
        Self(pairs)
    }

    /// Whether both revisions belong to the same lineage.
    pub fn same_lineage(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0[..self.0.len() - 1] == other.0[..other.0.len() - 1]
            && self.last().0 == other.last().0
    }

    /// Whether `self` lies on the parent chain of `other` (or equals it).
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        let mut current = Some(other.clone());
        while let Some(rev) = current {
            if &rev == self {
                return true;
            }
            current = rev.parent();
        }
        false
    }

    fn last(&self) -> (u32, u32) {
        self.0[self.0.len() - 1]
    }
}

impl TryFrom<String> for RevisionId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RevisionId> for String {
    fn from(id: RevisionId) -> Self {
        id.to_string()
    }
}

impl FromStr for RevisionId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (major, minor) in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{major}.{minor}")?;
            first = false;
        }
        Ok(())
    }
}

/// Unique, stable identity of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(Uuid);

impl FileId {
    /// Generate a fresh file id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a file id from its hyphenated form.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| TypeError::InvalidFileId(s.to_string()))
    }
}

impl FromStr for FileId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// A caller-supplied user identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Create a validated user name (non-empty, no control characters).
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TypeError::InvalidUserName("user name cannot be empty".into()));
        }
        if name.chars().any(char::is_control) {
            return Err(TypeError::InvalidUserName(
                "user name cannot contain control characters".into(),
            ));
        }
        Ok(Self(name))
    }

    /// Get the user name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a controlled file lives inside a project: directory relative to the
/// project root (`/`-separated, empty for the root) and the short workfile name.
///
/// # Example
///
/// ```
/// use branchvault::core::types::ArchiveLocation;
///
/// let loc = ArchiveLocation::new("src/util/", "io.rs").unwrap();
/// assert_eq!(loc.appended_path(), "src/util");
/// assert_eq!(loc.to_string(), "src/util/io.rs");
/// assert!(!loc.is_reserved());
/// assert!(ArchiveLocation::new(".bv-cemetery", "x").unwrap().is_reserved());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchiveLocation {
    appended_path: String,
    short_name: String,
}

impl ArchiveLocation {
    /// Create a location, normalizing separators and surrounding slashes.
    pub fn new(
        appended_path: impl AsRef<str>,
        short_name: impl Into<String>,
    ) -> Result<Self, TypeError> {
        let appended_path = appended_path
            .as_ref()
            .replace('\\', "/")
            .trim_matches('/')
            .to_string();
        let short_name = short_name.into();

        if short_name.is_empty() || short_name.contains(['/', '\\']) {
            return Err(TypeError::InvalidLocation(format!(
                "short name '{short_name}' must be a non-empty file name"
            )));
        }
        if appended_path
            .split('/')
            .any(|c| c == ".." || (c.is_empty() && !appended_path.is_empty()))
        {
            return Err(TypeError::InvalidLocation(format!(
                "appended path '{appended_path}' is not a clean relative path"
            )));
        }

        Ok(Self {
            appended_path,
            short_name,
        })
    }

    /// Split a `dir/sub/name` path into a location.
    pub fn from_relative_path(path: &str) -> Result<Self, TypeError> {
        let normalized = path.replace('\\', "/");
        match normalized.rsplit_once('/') {
            Some((dir, name)) => Self::new(dir, name),
            None => Self::new("", normalized),
        }
    }

    /// Directory relative to the project root.
    pub fn appended_path(&self) -> &str {
        &self.appended_path
    }

    /// Short workfile name.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Same directory, different name.
    pub fn renamed(&self, short_name: impl Into<String>) -> Result<Self, TypeError> {
        Self::new(&self.appended_path, short_name)
    }

    /// Same name, different directory.
    pub fn moved(&self, appended_path: impl AsRef<str>) -> Result<Self, TypeError> {
        Self::new(appended_path, self.short_name.clone())
    }

    /// Same directory, name with `suffix` appended.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self {
            appended_path: self.appended_path.clone(),
            short_name: format!("{}{}", self.short_name, suffix),
        }
    }

    /// Whether the location is inside a reserved cemetery or branch-archive directory.
    pub fn is_reserved(&self) -> bool {
        let first = self.appended_path.split('/').next().unwrap_or_default();
        first == CEMETERY_DIR || first == BRANCH_ARCHIVES_DIR
    }
}

impl fmt::Display for ArchiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.appended_path.is_empty() {
            write!(f, "{}", self.short_name)
        } else {
            write!(f, "{}/{}", self.appended_path, self.short_name)
        }
    }
}

/// The identifying tuple supplied with every request:
/// `{project, branch, appendedPath, shortName}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemCoordinate {
    pub project: String,
    pub branch: BranchName,
    pub location: ArchiveLocation,
}

impl ItemCoordinate {
    pub fn new(project: impl Into<String>, branch: BranchName, location: ArchiveLocation) -> Self {
        Self {
            project: project.into(),
            branch,
            location,
        }
    }
}

impl fmt::Display for ItemCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.project, self.branch, self.location)
    }
}

/// A UTC timestamp.
///
/// # Example
///
/// ```
/// use branchvault::core::types::UtcTimestamp;
///
/// let now = UtcTimestamp::now();
/// println!("Current time: {}", now);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Create a timestamp from a chrono DateTime.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(dt)
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// SHA-256 digest of a revision's reconstructed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Digest the given bytes.
    pub fn of(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        Self(hasher.finalize().into())
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First `len` hex characters.
    pub fn short(&self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len);
        hex
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let bytes = hex::decode(&s).map_err(|e| format!("invalid digest '{s}': {e}"))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| format!("digest '{s}' is not 32 bytes"))?;
        Ok(Self(arr))
    }
}

impl From<ContentDigest> for String {
    fn from(d: ContentDigest) -> Self {
        d.to_hex()
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod branch_name {
        use super::*;

        #[test]
        fn valid_names() {
            assert!(BranchName::new("main").is_ok());
            assert!(BranchName::new("release_1.2").is_ok());
            assert!(BranchName::new("user@feature").is_ok());
        }

        #[test]
        fn invalid_names() {
            assert!(BranchName::new("").is_err());
            assert!(BranchName::new("-x").is_err());
            assert!(BranchName::new("a b").is_err());
            assert!(BranchName::new("a:b").is_err());
            assert!(BranchName::new("a\tb").is_err());
            assert!(BranchName::new("x".repeat(129)).is_err());
        }

        #[test]
        fn trunk_is_valid_and_recognized() {
            let trunk = BranchName::new(TRUNK).unwrap();
            assert!(trunk.is_trunk());
            assert_eq!(trunk, BranchName::trunk());
            assert!(!BranchName::new("dev").unwrap().is_trunk());
        }

        #[test]
        fn serde_roundtrip() {
            let b = BranchName::new("feature").unwrap();
            let json = serde_json::to_string(&b).unwrap();
            assert_eq!(json, "\"feature\"");
            let parsed: BranchName = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, b);
            assert!(serde_json::from_str::<BranchName>("\"bad name\"").is_err());
        }
    }

    mod revision_id {
        use super::*;

        fn rev(s: &str) -> RevisionId {
            RevisionId::new(s).unwrap()
        }

        #[test]
        fn parse_and_display() {
            assert_eq!(rev("1.1").to_string(), "1.1");
            assert_eq!(rev("1.12.3.4").to_string(), "1.12.3.4");
        }

        #[test]
        fn rejects_malformed() {
            for bad in ["", "1", "1.", "1.0", "0.1", "1.2.3", "a.b", "1..2", "-1.1"] {
                assert!(RevisionId::new(bad).is_err(), "{bad} should be rejected");
            }
        }

        #[test]
        fn depth_counts_branch_levels() {
            assert_eq!(rev("1.5").depth(), 0);
            assert_eq!(rev("1.5.2.1").depth(), 1);
            assert_eq!(rev("1.5.2.1.1.3").depth(), 2);
        }

        #[test]
        fn parent_chain() {
            assert_eq!(rev("1.3").parent(), Some(rev("1.2")));
            assert_eq!(rev("1.1").parent(), None);
            assert_eq!(rev("1.3.1.1").parent(), Some(rev("1.3")));
            assert_eq!(rev("1.3.1.4").parent(), Some(rev("1.3.1.3")));
        }

        #[test]
        fn lineage_membership() {
            assert!(rev("1.3.1.1").same_lineage(&rev("1.3.1.9")));
            assert!(!rev("1.3.1.1").same_lineage(&rev("1.3.2.1")));
            assert!(!rev("1.3.1.1").same_lineage(&rev("1.4.1.1")));
            assert!(rev("1.1").same_lineage(&rev("1.7")));
            assert!(!rev("1.1").same_lineage(&rev("1.1.1.1")));
        }

        #[test]
        fn ancestry() {
            assert!(rev("1.2").is_ancestor_of(&rev("1.3.1.2")));
            assert!(rev("1.3.1.2").is_ancestor_of(&rev("1.3.1.2")));
            assert!(!rev("1.4").is_ancestor_of(&rev("1.3.1.2")));
        }

        #[test]
        fn ordering_puts_fork_point_first() {
            let mut revs = vec![rev("1.4"), rev("1.3.1.1"), rev("1.3")];
            revs.sort();
            assert_eq!(revs, vec![rev("1.3"), rev("1.3.1.1"), rev("1.4")]);
        }
    }

    mod location {
        use super::*;

        #[test]
        fn normalizes_slashes() {
            let loc = ArchiveLocation::new("/a\\b/", "f.txt").unwrap();
            assert_eq!(loc.appended_path(), "a/b");
        }

        #[test]
        fn rejects_parent_segments_and_bad_names() {
            assert!(ArchiveLocation::new("a/../b", "f").is_err());
            assert!(ArchiveLocation::new("a//b", "f").is_err());
            assert!(ArchiveLocation::new("a", "").is_err());
            assert!(ArchiveLocation::new("a", "x/y").is_err());
        }

        #[test]
        fn from_relative_path_splits() {
            let loc = ArchiveLocation::from_relative_path("docs/readme.md").unwrap();
            assert_eq!(loc.appended_path(), "docs");
            assert_eq!(loc.short_name(), "readme.md");
            let root = ArchiveLocation::from_relative_path("top.txt").unwrap();
            assert_eq!(root.appended_path(), "");
            assert_eq!(root.to_string(), "top.txt");
        }

        #[test]
        fn suffix_keeps_directory() {
            let loc = ArchiveLocation::new("d", "foo.txt").unwrap();
            assert_eq!(loc.with_suffix("-promoted").to_string(), "d/foo.txt-promoted");
        }

        #[test]
        fn reserved_directories() {
            assert!(ArchiveLocation::new(BRANCH_ARCHIVES_DIR, "x").unwrap().is_reserved());
            assert!(ArchiveLocation::new(format!("{CEMETERY_DIR}/deep"), "x")
                .unwrap()
                .is_reserved());
            assert!(!ArchiveLocation::new("src/.bv-cemetery", "x").unwrap().is_reserved());
        }
    }

    #[test]
    fn digest_hex_roundtrip() {
        let d = ContentDigest::of(b"hello");
        let json = serde_json::to_string(&d).unwrap();
        let parsed: ContentDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(d, parsed);
        assert_eq!(d.short(8).len(), 8);
        assert_ne!(d, ContentDigest::of(b"hello!"));
    }

    #[test]
    fn file_id_parse_display() {
        let id = FileId::generate();
        assert_eq!(FileId::parse(&id.to_string()).unwrap(), id);
        assert!(FileId::parse("nope").is_err());
    }

    #[test]
    fn user_name_validation() {
        assert!(UserName::new("alice").is_ok());
        assert!(UserName::new("  ").is_err());
        assert!(UserName::new("a\nb").is_err());
    }
}
