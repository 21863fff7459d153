//! Knowledge directory layout.
//!
//! Defines the fixed on-disk shape of the `.agp/` directory and the
//! post-bootstrap validation checklist. Every other module refers to
//! paths through the constants here rather than spelling them out.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::repo::{RepoError, RepoOps};

/// Name of the knowledge directory, relative to the project root.
pub const KNOWLEDGE_DIR: &str = ".agp";

/// Instructions file read by AI assistants on every session.
pub const INSTRUCTIONS_FILE: &str = "INSTRUCTIONS.md";

/// Ignore-rules file keeping machine-local state out of the repository.
pub const IGNORE_FILE: &str = ".gitignore";

/// Local-only JSON configuration file.
pub const CONFIG_FILE: &str = "config.json";

/// Subdirectories holding the knowledge Markdown files.
pub const SUBDIRS: [&str; 4] = ["architecture", "patterns", "project", "sessions"];

/// Entries that must exist after a successful bootstrap.
pub const REQUIRED_ENTRIES: [&str; 6] = [
    INSTRUCTIONS_FILE,
    IGNORE_FILE,
    "architecture",
    "patterns",
    "project",
    "sessions",
];

/// Validation failures, each naming the specific missing item.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required file or directory is missing from the knowledge directory.
    #[error("missing required entry in knowledge directory: {0}")]
    MissingEntry(String),

    /// The knowledge path is not registered as a submodule of the parent.
    #[error("knowledge directory is not registered as a git submodule")]
    SubmoduleMissing,

    /// A git query needed for validation failed.
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Observed state of the knowledge directory on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirState {
    /// The directory does not exist.
    Missing,
    /// The directory exists but has no entries at all.
    Empty,
    /// Every entry is hidden (dotfile). This is the signature of a freshly
    /// cloned parent repository whose submodule has not been populated.
    HiddenOnly,
    /// At least one visible entry exists.
    Populated,
}

/// Returns the knowledge directory path for a project root.
pub fn dir(project_root: &Path) -> PathBuf {
    project_root.join(KNOWLEDGE_DIR)
}

/// Classifies the on-disk state of a knowledge directory.
pub fn classify_dir(path: &Path) -> std::io::Result<DirState> {
    if !path.exists() {
        return Ok(DirState::Missing);
    }

    let mut any = false;
    let mut visible = false;
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        any = true;
        if !entry.file_name().to_string_lossy().starts_with('.') {
            visible = true;
        }
    }

    Ok(if !any {
        DirState::Empty
    } else if visible {
        DirState::Populated
    } else {
        DirState::HiddenOnly
    })
}

/// Ensures the fixed skeleton exists under the knowledge directory.
///
/// Creates the four subdirectories and writes the ignore file when it is
/// absent. Existing files are never overwritten, so this is safe to run
/// over a populated directory (e.g. after cloning a remote with history).
pub fn write_skeleton(knowledge_dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(knowledge_dir)?;
    for sub in SUBDIRS {
        fs::create_dir_all(knowledge_dir.join(sub))?;
    }

    let ignore = knowledge_dir.join(IGNORE_FILE);
    if !ignore.exists() {
        fs::write(&ignore, format!("{CONFIG_FILE}\n"))?;
    }

    Ok(())
}

/// Runs the post-bootstrap checklist.
///
/// Every required entry must exist and the parent repository must report
/// a non-empty submodule entry for the knowledge path. The first failure
/// is reported with the identifying name of the missing item.
pub fn validate(ops: &dyn RepoOps, project_root: &Path) -> Result<(), ValidationError> {
    let knowledge = dir(project_root);
    for entry in REQUIRED_ENTRIES {
        if !knowledge.join(entry).exists() {
            return Err(ValidationError::MissingEntry(entry.to_string()));
        }
    }

    match ops.submodule_head(project_root, KNOWLEDGE_DIR)? {
        Some(id) if !id.is_empty() => Ok(()),
        _ => Err(ValidationError::SubmoduleMissing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn classify_missing_dir() {
        let dir = tempdir().unwrap();
        let state = classify_dir(&dir.path().join("nope")).unwrap();
        assert_eq!(state, DirState::Missing);
    }

    #[test]
    fn classify_empty_dir() {
        let dir = tempdir().unwrap();
        assert_eq!(classify_dir(dir.path()).unwrap(), DirState::Empty);
    }

    #[test]
    fn classify_hidden_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".git"), "gitdir: ../.git/modules/agp").unwrap();
        assert_eq!(classify_dir(dir.path()).unwrap(), DirState::HiddenOnly);
    }

    #[test]
    fn classify_populated() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".git"), "x").unwrap();
        fs::write(dir.path().join("INSTRUCTIONS.md"), "x").unwrap();
        assert_eq!(classify_dir(dir.path()).unwrap(), DirState::Populated);
    }

    #[test]
    fn skeleton_creates_subdirs_and_ignore() {
        let dir = tempdir().unwrap();
        write_skeleton(dir.path()).unwrap();

        for sub in SUBDIRS {
            assert!(dir.path().join(sub).is_dir(), "missing {sub}");
        }
        let ignore = fs::read_to_string(dir.path().join(IGNORE_FILE)).unwrap();
        assert!(ignore.contains(CONFIG_FILE));
    }

    #[test]
    fn skeleton_preserves_existing_ignore() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(IGNORE_FILE), "custom\n").unwrap();
        write_skeleton(dir.path()).unwrap();

        let ignore = fs::read_to_string(dir.path().join(IGNORE_FILE)).unwrap();
        assert_eq!(ignore, "custom\n");
    }
}
