//! Push command - commit and push pending knowledge changes.

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::knowledge;
use crate::repo::{self, GitRepoOps};
use crate::sync::{self, PushOutcome};

/// Arguments for the push command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    agp push                           Commit with a generated message\n    \
    agp push --message \"docs: notes\"   Commit with an explicit message")]
pub struct Args {
    /// Explicit commit message (otherwise generated from the changed paths)
    #[arg(short, long)]
    pub message: Option<String>,
}

/// Executes the push command.
pub fn run(args: Args) -> Result<()> {
    let project_root = repo::discover_project_root(Path::new("."))
        .context("Not a git repository (run 'git init' first)")?;

    let dir = knowledge::dir(&project_root);
    if !dir.exists() {
        bail!("Knowledge directory not found. Run 'agp init' first.");
    }

    let ops = GitRepoOps::new();
    match sync::push_knowledge(&ops, &project_root, args.message.as_deref())? {
        PushOutcome::NothingToPush => {
            println!("{}", "Nothing to push - knowledge directory is clean.".dimmed());
        }
        PushOutcome::Pushed {
            message,
            parent_updated,
        } => {
            println!("{}", "Knowledge changes pushed.".green().bold());
            println!("  Commit: {}", message.cyan());
            if parent_updated {
                println!("  Parent submodule pointer updated.");
            }
        }
    }

    Ok(())
}
