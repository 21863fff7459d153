//! Session files.
//!
//! One Markdown file per user under `sessions/<user>/index.md`, created
//! from a fixed template on first `start`. AI agents append to the file
//! during work; this tool never rewrites an existing session file, it
//! only verifies the file is readable when a session resumes.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};

/// Fixed section headings of a session file.
pub const SECTION_HEADINGS: [&str; 6] = [
    "Active Files",
    "In Progress",
    "Blocked",
    "Next Up",
    "Decisions Made",
    "Notes",
];

/// Outcome of starting a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// A new session file was written for this user.
    Created,
    /// The user already had a session file; nothing was changed.
    Resumed,
}

/// Session file path for a user under the knowledge directory.
pub fn session_path(knowledge_dir: &Path, user: &str) -> PathBuf {
    knowledge_dir.join("sessions").join(user).join("index.md")
}

/// Begins or resumes a session for `user`.
///
/// New user: writes the session template. Existing user: verifies the
/// file is readable and leaves it untouched.
pub fn start(knowledge_dir: &Path, user: &str, now: DateTime<Local>) -> Result<SessionState> {
    validate_user(user)?;

    let path = session_path(knowledge_dir, user);
    if path.exists() {
        fs::read_to_string(&path)
            .with_context(|| format!("Session file is unreadable: {}", path.display()))?;
        return Ok(SessionState::Resumed);
    }

    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Session path has no parent: {}", path.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create session directory: {}", parent.display()))?;
    fs::write(&path, render(user, now))
        .with_context(|| format!("Failed to write session file: {}", path.display()))?;

    Ok(SessionState::Created)
}

/// User names become directory names, so they must be plain.
fn validate_user(user: &str) -> Result<()> {
    if user.is_empty() {
        bail!("User name must not be empty");
    }
    if user.contains(['/', '\\', '.']) || user.chars().any(char::is_whitespace) {
        bail!("User name must not contain path separators, dots, or whitespace: '{user}'");
    }
    Ok(())
}

fn render(user: &str, now: DateTime<Local>) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Session - {user}\n\n"));
    out.push_str(&format!("Started: {}\n", now.format("%Y-%m-%d %H:%M")));
    for heading in SECTION_HEADINGS {
        out.push_str(&format!("\n## {heading}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_start_writes_template_with_all_headings() {
        let dir = tempdir().unwrap();
        let state = start(dir.path(), "alice", Local::now()).unwrap();
        assert_eq!(state, SessionState::Created);

        let content = fs::read_to_string(session_path(dir.path(), "alice")).unwrap();
        assert!(content.starts_with("# Session - alice"));
        for heading in SECTION_HEADINGS {
            assert!(content.contains(&format!("## {heading}")), "missing {heading}");
        }
    }

    #[test]
    fn second_start_resumes_without_rewriting() {
        let dir = tempdir().unwrap();
        start(dir.path(), "alice", Local::now()).unwrap();

        let path = session_path(dir.path(), "alice");
        fs::write(&path, "agent notes").unwrap();

        let state = start(dir.path(), "alice", Local::now()).unwrap();
        assert_eq!(state, SessionState::Resumed);
        assert_eq!(fs::read_to_string(&path).unwrap(), "agent notes");
    }

    #[test]
    fn distinct_users_get_distinct_files() {
        let dir = tempdir().unwrap();
        start(dir.path(), "alice", Local::now()).unwrap();
        start(dir.path(), "bob", Local::now()).unwrap();

        assert!(session_path(dir.path(), "alice").exists());
        assert!(session_path(dir.path(), "bob").exists());
    }

    #[test]
    fn rejects_unsafe_user_names() {
        let dir = tempdir().unwrap();
        for bad in ["", "a/b", "..", "a b", "a\\b"] {
            assert!(start(dir.path(), bad, Local::now()).is_err(), "accepted {bad:?}");
        }
    }
}
