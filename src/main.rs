use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agp_cli::cli::commands;

/// The main CLI command line interface.
#[derive(Parser)]
#[command(name = "agp")]
#[command(version)]
#[command(about = "Shared knowledge base for AI coding assistants")]
#[command(long_about = "AGP maintains a knowledge directory (.agp/) next to your project,\n\
    versioned as its own git repository and linked into the parent as a\n\
    submodule. AI assistants read and append structured context there,\n\
    so reasoning survives across machines, branches, and sessions.")]
#[command(after_help = "EXAMPLES:\n    \
    agp init                 Bootstrap the knowledge directory\n    \
    agp start                Begin or resume a working session\n    \
    agp push                 Commit and push knowledge changes\n    \
    agp connect claude       Wire up Claude Code\n    \
    agp link <url>           Point the knowledge repo at a new remote\n\n\
    For more information about a command, run 'agp <command> --help'.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Bootstrap or re-bootstrap the knowledge directory
    #[command(long_about = "Creates the .agp/ knowledge directory from a template, links it\n\
        to a remote repository, and registers it as a submodule of the\n\
        current repository. On a cloned parent whose submodule is still\n\
        empty, pulls the existing knowledge content instead.")]
    Init(commands::init::Args),

    /// Begin or resume a named session
    #[command(long_about = "Creates a per-user session file under .agp/sessions/ on first\n\
        use, or verifies the existing one. The session file is where AI\n\
        agents record in-progress work, decisions, and notes.")]
    Start(commands::start::Args),

    /// Commit and push pending knowledge changes
    #[command(long_about = "Commits changes inside the knowledge repository with a message\n\
        generated from the changed paths, pushes them, and moves the\n\
        parent repository's submodule pointer. A clean tree is a no-op.")]
    Push(commands::push::Args),

    /// Change the knowledge repository's remote URL
    Link(commands::link::Args),

    /// Generate integration files for an AI tool
    #[command(long_about = "Writes the well-known guidance file for a supported AI tool\n\
        (claude, cursor, cline, aider), pointing it into the knowledge\n\
        directory. Unrecognized tool names are rejected.")]
    Connect(commands::connect::Args),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "agp_cli=debug"
    } else {
        "agp_cli=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    match cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Start(args) => commands::start::run(args),
        Commands::Push(args) => commands::push::run(args),
        Commands::Link(args) => commands::link::run(args),
        Commands::Connect(args) => commands::connect::run(args),
    }
}
