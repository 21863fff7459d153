//! Init command - bootstrap the knowledge directory.
//!
//! Creates `.agp/` from a template, links it to a remote, and registers
//! it as a submodule of the current repository. Re-running on a cloned
//! parent whose submodule is still empty pulls the existing content
//! instead.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::bootstrap;
use crate::cli::prompt::TerminalPrompt;
use crate::knowledge;
use crate::repo::{self, GitRepoOps};
use crate::template::TemplateSource;

/// Arguments for the init command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    agp init                                   Bootstrap with interactive prompts\n    \
    agp init --remote git@host:team/know.git   Skip the URL prompt\n    \
    agp init --force                           Re-initialize an existing directory")]
pub struct Args {
    /// Re-initialize even if the knowledge directory already exists
    #[arg(short, long)]
    pub force: bool,

    /// Template archive URL or local directory (defaults to the published template)
    #[arg(long)]
    pub template: Option<String>,

    /// Remote URL for the knowledge repository (prompted when absent)
    #[arg(long)]
    pub remote: Option<String>,
}

/// Executes the init command.
pub fn run(args: Args) -> Result<()> {
    println!("{}", "AGP Setup".bold().cyan());
    println!("{}", "Shared knowledge base for AI coding assistants".dimmed());
    println!();

    let project_root = repo::discover_project_root(Path::new("."))
        .context("Not a git repository (run 'git init' first)")?;

    let ops = GitRepoOps::new();
    let mut prompt = TerminalPrompt::new();
    let template = TemplateSource::from_arg(args.template.as_deref());

    let outcome = bootstrap::bootstrap(
        &ops,
        &mut prompt,
        &project_root,
        &template,
        args.force,
        args.remote.as_deref(),
    )?;

    println!();
    if outcome.pulled {
        println!("{}", "Knowledge directory populated from remote.".green().bold());
    } else {
        println!("{}", "Knowledge directory created and linked.".green().bold());
    }
    println!(
        "  Path:   {}",
        knowledge::dir(&project_root).display().to_string().cyan()
    );
    if !outcome.url.is_empty() {
        println!("  Remote: {}", outcome.url.cyan());
    }
    println!();
    println!("Next steps:");
    println!("  {} - Begin a working session", "agp start".cyan());
    println!("  {} - Wire up your AI tool", "agp connect <tool>".cyan());

    Ok(())
}
