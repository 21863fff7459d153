//! Connect command - generate tool-specific integration files.
//!
//! Each supported AI tool reads project guidance from its own well-known
//! file; `connect` writes a pointer there directing the tool into the
//! knowledge directory. Unrecognized tool names are rejected by argument
//! parsing before any work begins.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use colored::Colorize;

use crate::knowledge::{self, INSTRUCTIONS_FILE, KNOWLEDGE_DIR};
use crate::repo;
use crate::sniff::{self, ProjectKind};

/// Marker identifying AGP-managed content inside an integration file.
const MANAGED_MARKER: &str = "<!-- agp:managed -->";

/// The fixed set of supported AI tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Tool {
    /// Claude Code (CLAUDE.md)
    Claude,
    /// Cursor (.cursor/rules)
    Cursor,
    /// Cline (.clinerules)
    Cline,
    /// Aider (CONVENTIONS.md)
    Aider,
}

impl Tool {
    /// Default integration file path, relative to the project root.
    fn integration_path(self) -> &'static str {
        match self {
            Tool::Claude => "CLAUDE.md",
            Tool::Cursor => ".cursor/rules/agp.mdc",
            Tool::Cline => ".clinerules",
            Tool::Aider => "CONVENTIONS.md",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Tool::Claude => "Claude Code",
            Tool::Cursor => "Cursor",
            Tool::Cline => "Cline",
            Tool::Aider => "Aider",
        }
    }
}

/// Arguments for the connect command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    agp connect claude                 Write CLAUDE.md\n    \
    agp connect cursor                 Write .cursor/rules/agp.mdc\n    \
    agp connect cline --config RULES   Write to a custom path")]
pub struct Args {
    /// AI tool to generate an integration file for
    #[arg(value_enum)]
    pub tool: Tool,

    /// Write the integration file to a custom path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Executes the connect command.
pub fn run(args: Args) -> Result<()> {
    let project_root = repo::discover_project_root(Path::new("."))
        .context("Not a git repository (run 'git init' first)")?;

    if !knowledge::dir(&project_root).exists() {
        bail!("Knowledge directory not found. Run 'agp init' first.");
    }

    let kind = sniff::detect(&project_root);
    tracing::debug!(project_kind = %kind, "detected project type");

    let path = args
        .config
        .unwrap_or_else(|| project_root.join(args.tool.integration_path()));
    let content = render(args.tool, kind);

    if path.exists() {
        let existing = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if existing.contains(MANAGED_MARKER) {
            println!(
                "{} is already connected ({}).",
                args.tool.display_name(),
                path.display()
            );
            return Ok(());
        }
        // Append below whatever the user already has.
        fs::write(&path, format!("{existing}\n{content}"))
            .with_context(|| format!("Failed to update {}", path.display()))?;
    } else {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, &content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    println!(
        "{}",
        format!("Connected {}.", args.tool.display_name()).green().bold()
    );
    println!("  Created: {}", path.display().to_string().cyan());

    Ok(())
}

fn render(tool: Tool, kind: ProjectKind) -> String {
    let project_line = match kind {
        ProjectKind::Unknown => "This project".to_string(),
        kind => format!("This {kind} project"),
    };

    format!(
        "{MANAGED_MARKER}\n\
         # AGP knowledge base\n\n\
         {project_line} keeps persistent context for AI assistants in `{KNOWLEDGE_DIR}/`.\n\n\
         Before starting work ({tool_name}):\n\
         - Read `{KNOWLEDGE_DIR}/{INSTRUCTIONS_FILE}`.\n\
         - Open your session file under `{KNOWLEDGE_DIR}/sessions/<user>/index.md` and\n\
           record active files, decisions, and progress there as you go.\n\
         - Consult `{KNOWLEDGE_DIR}/architecture/`, `{KNOWLEDGE_DIR}/patterns/`, and\n\
           `{KNOWLEDGE_DIR}/project/` for accumulated project knowledge.\n",
        tool_name = tool.display_name(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_embeds_marker_and_paths() {
        let content = render(Tool::Claude, ProjectKind::React);
        assert!(content.starts_with(MANAGED_MARKER));
        assert!(content.contains("This React project"));
        assert!(content.contains(".agp/INSTRUCTIONS.md"));
        assert!(content.contains("Claude Code"));
    }

    #[test]
    fn render_handles_unknown_project() {
        let content = render(Tool::Aider, ProjectKind::Unknown);
        assert!(content.contains("This project keeps"));
    }

    #[test]
    fn integration_paths_are_tool_specific() {
        assert_eq!(Tool::Claude.integration_path(), "CLAUDE.md");
        assert_eq!(Tool::Cursor.integration_path(), ".cursor/rules/agp.mdc");
        assert_eq!(Tool::Cline.integration_path(), ".clinerules");
        assert_eq!(Tool::Aider.integration_path(), "CONVENTIONS.md");
    }
}
