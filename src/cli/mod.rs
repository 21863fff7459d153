//! Command-line interface for AGP.
//!
//! Provides the CLI commands for bootstrapping and maintaining the
//! knowledge directory: `init`, `start`, `push`, `link`, and `connect`.

/// Individual CLI command implementations.
pub mod commands;

/// Interactive terminal prompts.
pub mod prompt;
