//! Sync: propagate knowledge edits outward.
//!
//! Commits and pushes pending changes inside the knowledge repository,
//! then moves the parent repository's submodule pointer when the parent
//! sees the knowledge path as changed. A clean tree is a no-op that runs
//! zero git mutation commands.

use std::path::Path;

use anyhow::{Context, Result};

use crate::knowledge::{self, KNOWLEDGE_DIR};
use crate::repo::RepoOps;

/// Commit message used when no changed path matches a bucket.
pub const FALLBACK_MESSAGE: &str = "docs: update knowledge base";

/// Path prefixes and the commit-message fragment each contributes.
const BUCKETS: [(&str, &str); 4] = [
    ("sessions/", "session progress"),
    ("project/", "project knowledge"),
    ("patterns/", "patterns"),
    ("architecture/", "architecture"),
];

/// What a push invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The knowledge working tree was clean; nothing ran.
    NothingToPush,
    /// Changes were committed and pushed.
    Pushed {
        message: String,
        /// Whether the parent repository's submodule pointer moved.
        parent_updated: bool,
    },
}

/// Builds a commit message from short-status lines by categorizing the
/// changed paths into the four knowledge buckets.
pub fn commit_message(status: &[String]) -> String {
    let mut matched: Vec<&str> = Vec::new();
    for line in status {
        // "M sessions/alice/index.md" -> "sessions/alice/index.md"
        let path = line.split_whitespace().nth(1).unwrap_or("");
        for (prefix, label) in BUCKETS {
            if path.starts_with(prefix) && !matched.contains(&label) {
                matched.push(label);
            }
        }
    }

    if matched.is_empty() {
        FALLBACK_MESSAGE.to_string()
    } else {
        // Keep bucket order stable regardless of status order.
        let ordered: Vec<&str> = BUCKETS
            .iter()
            .map(|(_, label)| *label)
            .filter(|label| matched.contains(label))
            .collect();
        format!("docs: update {}", ordered.join(", "))
    }
}

/// Commits and pushes pending knowledge changes.
///
/// `message` overrides the generated commit message when given.
pub fn push_knowledge(
    ops: &dyn RepoOps,
    project_root: &Path,
    message: Option<&str>,
) -> Result<PushOutcome> {
    let knowledge = knowledge::dir(project_root);

    let status = ops
        .status_short(&knowledge)
        .context("Failed to read knowledge repository status")?;
    if status.is_empty() {
        return Ok(PushOutcome::NothingToPush);
    }

    let message = match message {
        Some(m) => m.to_string(),
        None => commit_message(&status),
    };
    tracing::debug!(%message, changes = status.len(), "committing knowledge changes");

    ops.commit_all(&knowledge, &message)
        .context("Failed to commit knowledge changes")?;
    ops.push(&knowledge, false)
        .context("Failed to push knowledge repository")?;

    let parent_updated = update_parent_pointer(ops, project_root)
        .context("Failed to update submodule pointer in parent repository")?;

    Ok(PushOutcome::Pushed {
        message,
        parent_updated,
    })
}

/// Stages and commits the submodule pointer in the parent, but only when
/// the parent's status actually shows the knowledge path as changed.
///
/// The commit takes the parent index as-is, so anything the user already
/// had staged rides along with the pointer bump.
fn update_parent_pointer(ops: &dyn RepoOps, project_root: &Path) -> Result<bool> {
    let parent_status = ops.status_short(project_root)?;
    if !knowledge_path_changed(&parent_status) {
        return Ok(false);
    }

    ops.stage(project_root, KNOWLEDGE_DIR)?;
    ops.commit_staged(project_root, "chore: update knowledge submodule")?;
    Ok(true)
}

/// True when a short-status line names the knowledge directory itself or
/// something under it. Sibling entries like `.agp-backup` do not count.
fn knowledge_path_changed(status: &[String]) -> bool {
    status.iter().any(|line| {
        line.split_whitespace().nth(1).is_some_and(|path| {
            path == KNOWLEDGE_DIR
                || path
                    .strip_prefix(KNOWLEDGE_DIR)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    })
}
