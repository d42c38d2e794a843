//! core
//!
//! Core domain types, configuration and project plumbing.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, RevisionId, FileId, etc.
//! - [`graph`] - Project branch tree
//! - [`ops`] - Ownership locking and durable writes
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for project storage
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - No process-wide state; everything is owned by a `Project`

pub mod config;
pub mod graph;
pub mod ops;
pub mod paths;
pub mod types;
