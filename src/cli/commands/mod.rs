//! CLI commands for AGP.
//!
//! Each submodule implements a single CLI command with its argument
//! parsing and execution logic.

/// Generate integration files for AI coding tools.
pub mod connect;

/// Bootstrap the knowledge directory and its submodule linkage.
pub mod init;

/// Change the knowledge repository's remote URL.
pub mod link;

/// Commit and push pending knowledge changes.
pub mod push;

/// Begin or resume a named session.
pub mod start;
