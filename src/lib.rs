//! AGP - a shared knowledge base for AI coding assistants.
//!
//! AGP scaffolds a knowledge directory (`.agp/`) next to your project,
//! versioned as its own git repository and registered as a submodule of
//! the parent, so assistant context survives across machines, branches,
//! and sessions.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod knowledge;
pub mod repo;
pub mod session;
pub mod sniff;
pub mod sync;
pub mod template;
