//! core::ops
//!
//! Project ownership and durable writes.
//!
//! # Modules
//!
//! - [`lock`] - Exclusive project ownership lock
//! - [`durable`] - Atomic temp-fsync-rename file replacement
//!
//! # Architecture
//!
//! Opening a project:
//! 1. Acquires the exclusive ownership lock
//! 2. Loads the branch graph and archive headers
//!
//! Every mutation that reaches disk is written through
//! [`durable::write_atomic`], so an interrupted write never corrupts the
//! previous state.

pub mod durable;
pub mod lock;

pub use durable::write_atomic;
pub use lock::{ProjectLock, ProjectLockError};
