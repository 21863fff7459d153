//! Start command - begin or resume a named session.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Local;
use colored::Colorize;

use crate::cli::prompt::prompt_line;
use crate::config::Config;
use crate::knowledge;
use crate::repo;
use crate::session::{self, SessionState};

/// Arguments for the start command.
#[derive(clap::Args)]
pub struct Args {
    /// Session user name (prompted on first use, remembered afterwards)
    #[arg(short, long)]
    pub user: Option<String>,
}

/// Executes the start command.
///
/// Resolves the user name from the argument, the stored config, or an
/// interactive prompt, then creates the session file on first use.
pub fn run(args: Args) -> Result<()> {
    let project_root = repo::discover_project_root(Path::new("."))
        .context("Not a git repository (run 'git init' first)")?;

    let dir = knowledge::dir(&project_root);
    if !dir.join(knowledge::INSTRUCTIONS_FILE).exists() {
        bail!("Knowledge directory not found. Run 'agp init' first.");
    }

    let mut config = Config::load(&dir);
    let user = match args.user {
        Some(user) => user,
        None if !config.session.user.is_empty() => config.session.user.clone(),
        None => {
            let name = prompt_line("Your name", None)?;
            if name.is_empty() {
                bail!("A user name is required to start a session");
            }
            name
        }
    };

    let now = Local::now();
    let state = session::start(&dir, &user, now)?;

    config.session.user = user.clone();
    config.session.current = now.to_rfc3339();
    config.save(&dir)?;

    let path = session::session_path(&dir, &user);
    match state {
        SessionState::Created => {
            println!("{}", format!("Session started for {user}").green().bold());
            println!("  Created: {}", path.display().to_string().cyan());
        }
        SessionState::Resumed => {
            println!("{}", format!("Resuming session for {user}").green());
            println!("  Session file: {}", path.display().to_string().cyan());
        }
    }

    Ok(())
}
