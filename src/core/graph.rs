//! core::graph
//!
//! Project branch graph.
//!
//! # Architecture
//!
//! Branches form a tree rooted at `trunk`:
//! - Nodes are project branches
//! - Edges point from child to parent (stored as a parent pointer)
//! - Every archive shares this one graph; per-archive state is kept in
//!   archive views keyed by branch name
//!
//! The graph persists as `branches.json`.
//!
//! # Invariants
//!
//! - `trunk` is always present and has no parent
//! - Every other branch has exactly one parent that already exists
//! - The graph is acyclic

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ops::durable;
use super::types::{BranchName, UserName, UtcTimestamp};

/// Errors from branch graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("branch '{0}' already exists")]
    AlreadyExists(BranchName),

    #[error("unknown branch '{0}'")]
    UnknownBranch(BranchName),

    #[error("branch graph contains a cycle through '{0}'")]
    Cycle(BranchName),

    #[error("branch graph file is invalid: {0}")]
    Invalid(String),

    #[error("branch graph i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a branch accepts changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchKind {
    /// Takes its own edits and promotes them into its parent.
    #[default]
    Feature,
    /// Shows its parent's files and refuses every change.
    ReadOnly,
}

impl std::fmt::Display for BranchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Feature => "feature",
            Self::ReadOnly => "read-only",
        })
    }
}

/// Persisted record of one non-trunk branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BranchRecord {
    pub parent: BranchName,
    pub created_by: UserName,
    pub created_at: UtcTimestamp,
    #[serde(default)]
    pub kind: BranchKind,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct BranchFile {
    branches: BTreeMap<BranchName, BranchRecord>,
}

/// The branch tree of a project.
#[derive(Debug, Clone)]
pub struct BranchGraph {
    records: BTreeMap<BranchName, BranchRecord>,
    /// Cached children sets (derived from parents)
    children: HashMap<BranchName, HashSet<BranchName>>,
}

impl Default for BranchGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchGraph {
    /// A graph holding only `trunk`.
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            children: HashMap::new(),
        }
    }

    /// Add a branch under `parent`.
    ///
    /// # Errors
    ///
    /// [`GraphError::AlreadyExists`] if the name is taken (including `trunk`),
    /// [`GraphError::UnknownBranch`] if the parent does not exist.
    pub fn add_branch(
        &mut self,
        name: BranchName,
        parent: BranchName,
        created_by: UserName,
    ) -> Result<(), GraphError> {
        self.add_branch_of_kind(name, parent, created_by, BranchKind::Feature)
    }

    /// Add a branch of the given kind under `parent`.
    pub fn add_branch_of_kind(
        &mut self,
        name: BranchName,
        parent: BranchName,
        created_by: UserName,
        kind: BranchKind,
    ) -> Result<(), GraphError> {
        if self.contains(&name) {
            return Err(GraphError::AlreadyExists(name));
        }
        if !self.contains(&parent) {
            return Err(GraphError::UnknownBranch(parent));
        }
        self.insert(
            name,
            BranchRecord {
                parent,
                created_by,
                created_at: UtcTimestamp::now(),
                kind,
            },
        );
        Ok(())
    }

    fn insert(&mut self, name: BranchName, record: BranchRecord) {
        self.children
            .entry(record.parent.clone())
            .or_default()
            .insert(name.clone());
        self.records.insert(name, record);
    }

    /// Whether the branch exists.
    pub fn contains(&self, branch: &BranchName) -> bool {
        branch.is_trunk() || self.records.contains_key(branch)
    }

    /// Fail unless the branch exists.
    pub fn require(&self, branch: &BranchName) -> Result<(), GraphError> {
        if self.contains(branch) {
            Ok(())
        } else {
            Err(GraphError::UnknownBranch(branch.clone()))
        }
    }

    /// Get the parent of a branch (`None` for trunk and unknown branches).
    pub fn parent(&self, branch: &BranchName) -> Option<&BranchName> {
        self.records.get(branch).map(|r| &r.parent)
    }

    /// Whether the branch refuses changes. Trunk never does.
    pub fn is_read_only(&self, branch: &BranchName) -> bool {
        self.records
            .get(branch)
            .is_some_and(|r| r.kind == BranchKind::ReadOnly)
    }

    /// Get the persisted record of a branch.
    pub fn record(&self, branch: &BranchName) -> Option<&BranchRecord> {
        self.records.get(branch)
    }

    /// Get the children of a branch.
    pub fn children(&self, branch: &BranchName) -> Option<&HashSet<BranchName>> {
        self.children.get(branch)
    }

    /// All branches, trunk first then by name.
    pub fn branches(&self) -> Vec<BranchName> {
        std::iter::once(BranchName::trunk())
            .chain(self.records.keys().cloned())
            .collect()
    }

    /// Get all ancestors of a branch, immediate parent first, ending at trunk.
    ///
    /// # Example
    ///
    /// ```
    /// use branchvault::core::graph::BranchGraph;
    /// use branchvault::core::types::{BranchName, UserName};
    ///
    /// let user = UserName::new("ann").unwrap();
    /// let mut graph = BranchGraph::new();
    /// let dev = BranchName::new("dev").unwrap();
    /// let fix = BranchName::new("fix").unwrap();
    ///
    /// graph.add_branch(dev.clone(), BranchName::trunk(), user.clone()).unwrap();
    /// graph.add_branch(fix.clone(), dev.clone(), user).unwrap();
    ///
    /// assert_eq!(graph.ancestors(&fix), vec![dev, BranchName::trunk()]);
    /// ```
    pub fn ancestors(&self, branch: &BranchName) -> Vec<BranchName> {
        let mut result = Vec::new();
        let mut current = self.parent(branch);

        while let Some(parent) = current {
            result.push(parent.clone());
            current = self.parent(parent);
        }

        result
    }

    /// The branch followed by its ancestors.
    pub fn lineage(&self, branch: &BranchName) -> Vec<BranchName> {
        let mut chain = vec![branch.clone()];
        chain.extend(self.ancestors(branch));
        chain
    }

    /// Whether `ancestor` is `branch` or lies on its parent chain.
    pub fn is_self_or_ancestor(&self, ancestor: &BranchName, branch: &BranchName) -> bool {
        ancestor == branch || self.ancestors(branch).contains(ancestor)
    }

    /// Distance from trunk.
    pub fn depth(&self, branch: &BranchName) -> usize {
        self.ancestors(branch).len()
    }

    /// Get all descendants of a branch (children, grandchildren, etc.).
    pub fn descendants(&self, branch: &BranchName) -> HashSet<BranchName> {
        let mut result = HashSet::new();
        let mut queue = VecDeque::new();

        if let Some(children) = self.children(branch) {
            queue.extend(children.iter().cloned());
        }

        while let Some(current) = queue.pop_front() {
            if result.insert(current.clone()) {
                if let Some(children) = self.children(&current) {
                    queue.extend(children.iter().cloned());
                }
            }
        }

        result
    }

    /// Branches sorted by depth from trunk (closest first), then by name.
    pub fn topological_order(&self) -> Vec<BranchName> {
        let mut by_depth: Vec<(usize, BranchName)> = self
            .branches()
            .into_iter()
            .map(|b| (self.depth(&b), b))
            .collect();

        by_depth.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.as_str().cmp(b.1.as_str())));

        by_depth.into_iter().map(|(_, branch)| branch).collect()
    }

    /// Check if the parent links contain a cycle.
    ///
    /// Returns `Some(branch)` if a cycle is detected starting from that branch.
    pub fn find_cycle(&self) -> Option<BranchName> {
        let mut visited = HashSet::new();
        let mut path = HashSet::new();

        for branch in self.records.keys() {
            if self.has_cycle_from(branch, &mut visited, &mut path) {
                return Some(branch.clone());
            }
        }
        None
    }

    fn has_cycle_from(
        &self,
        branch: &BranchName,
        visited: &mut HashSet<BranchName>,
        path: &mut HashSet<BranchName>,
    ) -> bool {
        if path.contains(branch) {
            return true;
        }
        if visited.contains(branch) {
            return false;
        }

        visited.insert(branch.clone());
        path.insert(branch.clone());

        if let Some(parent) = self.parent(branch) {
            if self.has_cycle_from(parent, visited, path) {
                return true;
            }
        }

        path.remove(branch);
        false
    }

    /// Load the graph from `branches.json`.
    ///
    /// # Errors
    ///
    /// I/O and parse failures, a record for `trunk`, a dangling parent, or a cycle.
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path)?;
        let file: BranchFile =
            serde_json::from_str(&content).map_err(|e| GraphError::Invalid(e.to_string()))?;

        let mut graph = Self::new();
        for (name, record) in file.branches {
            if name.is_trunk() {
                return Err(GraphError::Invalid("trunk cannot have a parent".into()));
            }
            graph.insert(name, record);
        }

        for (name, record) in &graph.records {
            if !graph.contains(&record.parent) {
                return Err(GraphError::Invalid(format!(
                    "branch '{name}' has unknown parent '{}'",
                    record.parent
                )));
            }
        }
        if let Some(branch) = graph.find_cycle() {
            return Err(GraphError::Cycle(branch));
        }

        Ok(graph)
    }

    /// Persist the graph atomically.
    pub fn save(&self, path: &Path) -> Result<(), GraphError> {
        let file = BranchFile {
            branches: self.records.clone(),
        };
        let json =
            serde_json::to_string_pretty(&file).map_err(|e| GraphError::Invalid(e.to_string()))?;
        durable::write_atomic(path, json.as_bytes())?;
        Ok(())
    }
}
