//! branchvault - a multi-user version-control engine
//!
//! Files are stored as per-file archives of reverse-delta revisions. Each
//! archive carries labels, per-revision locks and branch-scoped views, and
//! changes made on a branch are promoted into its parent with a three-way
//! merge.
//!
//! # Architecture
//!
//! The codebase is layered bottom-up:
//!
//! - [`core`] - Domain types, branch graph, configuration, project paths
//! - [`codec`] - Compression, line diff and reverse-delta scripts
//! - [`archive`] - Revision storage, archive file format and store
//! - [`tree`] - Revision resolution per branch, labels, history
//! - [`locks`] - Per-revision locks and the cross-archive lock index
//! - [`promote`] - Promotion candidates, three-way merge, promotion engine
//! - [`txn`] - Transaction envelopes and change notifications
//! - [`engine`] - The project façade every operation enters through
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. Stored revisions reconstruct to exactly the bytes checked in
//! 2. An archive file is only ever replaced atomically
//! 3. A failed operation changes neither disk nor memory
//! 4. One process owns a project at a time

pub mod archive;
pub mod cli;
pub mod codec;
pub mod core;
pub mod engine;
pub mod locks;
pub mod promote;
pub mod tree;
pub mod txn;
pub mod ui;
