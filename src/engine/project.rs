//! engine::project
//!
//! Project lifecycle and the per-archive exclusive sections.
//!
//! # Lock order
//!
//! `namespace`, then `graph`, then one archive section. The namespace lock
//! serializes operations that check a location is free and then claim it
//! (create, rename, move, undelete, promote). Plain content operations never
//! take it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard, RwLock};

use super::EngineError;
use crate::archive::{Archive, ArchiveStore};
use crate::core::config::{Config, ProjectConfig};
use crate::core::graph::{BranchGraph, BranchKind, BranchRecord};
use crate::core::ops::ProjectLock;
use crate::core::paths::ProjectPaths;
use crate::core::types::{ArchiveLocation, BranchName, FileId, UserName, UtcTimestamp};
use crate::locks::LockRegistry;
use crate::tree;
use crate::txn::{
    ConnectionId, Notification, NotificationSink, NullSink, RequestContext, TransactionManager,
};

type ArchiveHandle = Arc<RwLock<Archive>>;

/// An open project.
pub struct Project {
    paths: ProjectPaths,
    config: Config,
    _ownership: ProjectLock,
    namespace: Mutex<()>,
    graph: RwLock<BranchGraph>,
    store: ArchiveStore,
    archives: DashMap<FileId, ArchiveHandle>,
    pub(super) locks: LockRegistry,
    txns: TransactionManager,
    sink: Arc<dyn NotificationSink + Send + Sync>,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("root", &self.paths.root())
            .field("archives", &self.archives.len())
            .finish_non_exhaustive()
    }
}

impl Project {
    /// Create the project layout at `root` (if missing) and open it.
    ///
    /// `settings`, when given, is written as the project's `config.toml`.
    pub fn init(root: impl Into<PathBuf>, settings: Option<&ProjectConfig>) -> Result<Self, EngineError> {
        let paths = ProjectPaths::new(root.into());
        paths.ensure_dirs()?;
        if !paths.branches_path().is_file() {
            BranchGraph::new().save(&paths.branches_path())?;
        }
        if let Some(settings) = settings {
            Config::write_project(paths.root(), settings)?;
        }
        tracing::info!(root = %paths.root().display(), "project initialized");
        Self::open(paths.root())
    }

    /// Open an initialized project and load every archive.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotInitialized`] when `root` is not a project,
    /// [`EngineError::ProjectLock`] when another process owns it, and any
    /// configuration, graph or archive load failure.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, EngineError> {
        let paths = ProjectPaths::new(root.as_ref().to_path_buf());
        if !paths.is_initialized() {
            return Err(EngineError::NotInitialized(paths.root().to_path_buf()));
        }
        let ownership = ProjectLock::acquire(&paths)?;
        let config = Config::load(Some(paths.root()))?;
        let graph = BranchGraph::load(&paths.branches_path())?;
        let store = ArchiveStore::new(paths.clone());

        let loaded = store
            .list()?
            .into_iter()
            .map(|id| store.load(id))
            .collect::<Result<Vec<Archive>, _>>()?;
        let locks = LockRegistry::new();
        locks.rebuild(&loaded);
        let archives: DashMap<FileId, ArchiveHandle> = loaded
            .into_iter()
            .map(|archive| (archive.file_id(), Arc::new(RwLock::new(archive))))
            .collect();
        tracing::debug!(
            root = %paths.root().display(),
            archives = archives.len(),
            branches = graph.branches().len(),
            "project opened"
        );

        Ok(Self {
            paths,
            config,
            _ownership: ownership,
            namespace: Mutex::new(()),
            graph: RwLock::new(graph),
            store,
            archives,
            locks,
            txns: TransactionManager::new(),
            sink: Arc::new(NullSink),
        })
    }

    /// Deliver notifications to `sink` instead of discarding them.
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink + Send + Sync>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the loaded configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn lock_registry(&self) -> &LockRegistry {
        &self.locks
    }

    // --- transactions -----------------------------------------------------

    /// Open a transaction envelope on a new connection for `user`.
    pub fn begin(&self, user: UserName) -> RequestContext {
        self.begin_on(ConnectionId::new(), user)
    }

    /// Open (or nest) a transaction envelope on `connection`.
    pub fn begin_on(&self, connection: ConnectionId, user: UserName) -> RequestContext {
        let transaction = self.txns.begin(connection);
        RequestContext {
            connection,
            transaction,
            user,
            timestamp: UtcTimestamp::now(),
        }
    }

    /// Close the envelope `ctx` opened.
    pub fn end(&self, ctx: &RequestContext) {
        self.txns.end(ctx.connection, ctx.transaction, self.sink.as_ref());
    }

    pub(super) fn notify(&self, ctx: &RequestContext, notification: Notification) {
        self.txns.notify(ctx.connection, notification, self.sink.as_ref());
    }

    // --- branches ---------------------------------------------------------

    /// Add a feature branch under `parent` and persist the graph.
    pub fn create_branch(
        &self,
        ctx: &RequestContext,
        name: BranchName,
        parent: BranchName,
    ) -> Result<(), EngineError> {
        self.create_branch_of_kind(ctx, name, parent, BranchKind::Feature)
    }

    /// Add a branch of `kind` under `parent` and persist the graph.
    pub fn create_branch_of_kind(
        &self,
        ctx: &RequestContext,
        name: BranchName,
        parent: BranchName,
        kind: BranchKind,
    ) -> Result<(), EngineError> {
        let mut graph = self.graph.write();
        let mut updated = graph.clone();
        updated.add_branch_of_kind(name.clone(), parent.clone(), ctx.user.clone(), kind)?;
        updated.save(&self.paths.branches_path())?;
        *graph = updated;
        tracing::info!(branch = %name, parent = %parent, %kind, user = %ctx.user, "branch created");
        Ok(())
    }

    /// Every branch with its record, trunk first.
    pub fn branches(&self) -> Vec<(BranchName, Option<BranchRecord>)> {
        let graph = self.graph.read();
        graph
            .branches()
            .into_iter()
            .map(|b| {
                let record = graph.record(&b).cloned();
                (b, record)
            })
            .collect()
    }

    /// Branches in display order (each parent before its children, siblings
    /// by name) with their parent and depth.
    pub fn branch_tree(&self) -> Vec<(BranchName, Option<BranchName>, usize)> {
        let graph = self.graph.read();
        let mut out = Vec::new();
        let mut stack = vec![(BranchName::trunk(), 0usize)];
        while let Some((branch, depth)) = stack.pop() {
            if let Some(children) = graph.children(&branch) {
                let mut children: Vec<&BranchName> = children.iter().collect();
                children.sort();
                stack.extend(children.into_iter().rev().map(|c| (c.clone(), depth + 1)));
            }
            let parent = graph.parent(&branch).cloned();
            out.push((branch, parent, depth));
        }
        out
    }

    /// Kind of `branch`; trunk is a feature branch with no parent.
    pub fn branch_kind(&self, branch: &BranchName) -> Result<BranchKind, EngineError> {
        let graph = self.graph.read();
        graph.require(branch)?;
        Ok(graph.record(branch).map(|r| r.kind).unwrap_or_default())
    }

    /// Parent of `branch`.
    pub fn parent_of(&self, branch: &BranchName) -> Result<Option<BranchName>, EngineError> {
        let graph = self.graph.read();
        graph.require(branch)?;
        Ok(graph.parent(branch).cloned())
    }

    // --- archive sections -------------------------------------------------

    fn handle(&self, id: FileId) -> Result<ArchiveHandle, EngineError> {
        self.archives
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(EngineError::UnknownArchive(id))
    }

    /// Every archive id, live and buried.
    pub fn archive_ids(&self) -> Vec<FileId> {
        let mut ids: Vec<FileId> = self.archives.iter().map(|e| *e.key()).collect();
        ids.sort();
        ids
    }

    /// Run `f` under the archive's shared section.
    pub(super) fn read_archive<T>(
        &self,
        id: FileId,
        f: impl FnOnce(&Archive, &BranchGraph) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let graph = self.graph.read();
        let handle = self.handle(id)?;
        let archive = handle.read();
        f(&archive, &graph)
    }

    /// Run `f` under the archive's exclusive section and commit the result.
    ///
    /// `f` works on a copy; the copy replaces the archive only after a
    /// successful commit.
    pub(super) fn mutate_archive<T>(
        &self,
        id: FileId,
        f: impl FnOnce(&mut Archive, &BranchGraph) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let graph = self.graph.read();
        let handle = self.handle(id)?;
        let mut archive = handle.write();

        let mut working = archive.clone();
        let out = f(&mut working, &graph)?;
        if working.is_dirty() {
            self.store.commit(&mut working)?;
        }
        *archive = working;
        self.locks.sync(&archive);
        Ok(out)
    }

    /// Commit a brand new archive and register it.
    pub(super) fn insert_archive(&self, mut archive: Archive) -> Result<FileId, EngineError> {
        let id = archive.file_id();
        self.store.commit(&mut archive)?;
        self.locks.sync(&archive);
        self.archives.insert(id, Arc::new(RwLock::new(archive)));
        Ok(id)
    }

    /// Hold while checking that a location is free and claiming it.
    pub(super) fn namespace(&self) -> MutexGuard<'_, ()> {
        self.namespace.lock()
    }

    /// Graph access for callers that need a consistent view across archives.
    pub(super) fn graph(&self) -> parking_lot::RwLockReadGuard<'_, BranchGraph> {
        self.graph.read()
    }

    /// Archives visible on `branch` with their locations there, sorted by
    /// location. `skip` is excluded without taking its section.
    pub(super) fn visible_on(
        &self,
        graph: &BranchGraph,
        branch: &BranchName,
        skip: Option<FileId>,
    ) -> Vec<(FileId, ArchiveLocation)> {
        let mut found: Vec<(FileId, ArchiveLocation)> = self
            .archive_ids()
            .into_iter()
            .filter(|id| Some(*id) != skip)
            .filter_map(|id| {
                let handle = self.handle(id).ok()?;
                let archive = handle.read();
                tree::is_visible(&archive, graph, branch)
                    .then(|| (id, tree::resolve_location(&archive, graph, branch)))
            })
            .collect();
        found.sort_by(|a, b| a.1.cmp(&b.1));
        found
    }

    /// Archive visible at `location` on `branch`.
    pub fn find(&self, branch: &BranchName, location: &ArchiveLocation) -> Option<FileId> {
        let graph = self.graph.read();
        self.visible_on(&graph, branch, None)
            .into_iter()
            .find(|(_, loc)| loc == location)
            .map(|(id, _)| id)
    }

    /// Archives visible on `branch`.
    pub fn list(&self, branch: &BranchName) -> Result<Vec<(FileId, ArchiveLocation)>, EngineError> {
        let graph = self.graph.read();
        graph.require(branch)?;
        Ok(self.visible_on(&graph, branch, None))
    }

    /// Snapshot of one archive.
    pub fn archive(&self, id: FileId) -> Result<Archive, EngineError> {
        Ok(self.handle(id)?.read().clone())
    }
}
