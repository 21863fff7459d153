//! Link command - change the knowledge repository's remote URL.
//!
//! Rewrites `origin` on the nested repository, the parent's submodule
//! record, and the stored config, keeping all three in agreement.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use colored::Colorize;

use crate::config::Config;
use crate::knowledge::{self, KNOWLEDGE_DIR};
use crate::repo::{self, GitRepoOps, RepoOps};

/// Arguments for the link command.
#[derive(clap::Args)]
pub struct Args {
    /// New remote URL for the knowledge repository
    pub url: String,
}

/// Executes the link command.
pub fn run(args: Args) -> Result<()> {
    let project_root = repo::discover_project_root(Path::new("."))
        .context("Not a git repository (run 'git init' first)")?;

    let dir = knowledge::dir(&project_root);
    let ops = GitRepoOps::new();
    if !ops.is_repo(&dir) {
        bail!("Knowledge directory not found. Run 'agp init' first.");
    }

    ops.set_remote_url(&dir, "origin", &args.url)
        .context("Failed to update knowledge repository remote")?;
    ops.submodule_set_url(&project_root, KNOWLEDGE_DIR, &args.url)
        .context("Failed to update submodule URL in parent repository")?;

    let mut config = Config::load(&dir);
    config.submodule.repository = args.url.clone();
    config.submodule.last_updated = Utc::now().to_rfc3339();
    config.save(&dir)?;

    println!("{}", "Knowledge repository relinked.".green().bold());
    println!("  Remote: {}", args.url.cyan());

    Ok(())
}
