//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All user-facing text goes through this module so quiet and debug modes
//! behave the same in every command. Diagnostics go through `tracing`.

pub mod output;
