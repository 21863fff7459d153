//! Submodule bootstrap.
//!
//! Brings the knowledge directory into existence, populates it from a
//! template, links it to a remote, and registers it as a submodule of
//! the parent repository. The flow tolerates a non-empty remote through
//! a three-way interactive resolution and retries failed link attempts
//! up to a fixed budget.
//!
//! All git effects go through [`RepoOps`] and all terminal interaction
//! through [`Prompt`], so the whole flow runs against scripted fakes and
//! file-path remotes in tests.

pub mod merge;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;

use crate::config::Config;
use crate::knowledge::{self, DirState, KNOWLEDGE_DIR};
use crate::repo::{RepoError, RepoOps};
use crate::template::{self, TemplateSource};

/// Link attempts before the bootstrap gives up.
pub const LINK_ATTEMPTS: u32 = 3;

/// How to proceed when the chosen remote already has history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Pull what merges cleanly, then force-push the local state.
    Overwrite,
    /// Keep the remote's history and fold the template into it.
    Merge,
    /// Discard this attempt and ask for a different URL.
    Cancel,
}

/// Terminal interaction needed by the bootstrap flow.
///
/// Kept separate from the resolution logic itself so the merge and
/// overwrite paths are testable without a terminal.
pub trait Prompt {
    /// Asks for a remote URL, offering `default` when present.
    fn remote_url(&mut self, default: Option<&str>) -> Result<String>;

    /// Asks how to resolve a rejected push.
    fn resolution(&mut self) -> Result<Resolution>;
}

/// What a successful bootstrap produced.
#[derive(Debug, Clone)]
pub struct BootstrapOutcome {
    /// Remote URL the knowledge repository is linked to.
    pub url: String,
    /// True when the pull path ran (cloned parent, submodule populated
    /// in place) instead of a fresh template bootstrap.
    pub pulled: bool,
}

/// Bootstraps the knowledge directory under `project_root`.
///
/// `remote` short-circuits the first URL prompt; the stored config URL
/// does the same when no explicit remote is given. See the module docs
/// for the full flow.
pub fn bootstrap(
    ops: &dyn RepoOps,
    prompt: &mut dyn Prompt,
    project_root: &Path,
    template: &TemplateSource,
    force: bool,
    remote: Option<&str>,
) -> Result<BootstrapOutcome> {
    if !ops.is_repo(project_root) {
        bail!(
            "Not a git repository: {} (run 'git init' first)",
            project_root.display()
        );
    }

    let dir = knowledge::dir(project_root);
    // Loaded before any deletion so a forced re-init preserves it.
    let mut config = Config::load(&dir);

    let registered = ops
        .submodule_head(project_root, KNOWLEDGE_DIR)?
        .is_some();

    match knowledge::classify_dir(&dir).context("Failed to inspect knowledge directory")? {
        DirState::Populated if !force => {
            bail!(
                "Knowledge directory already exists: {} (use --force to re-initialize)",
                dir.display()
            );
        }
        DirState::Populated => {
            tracing::info!(path = %dir.display(), "removing knowledge directory for re-init");
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to remove {}", dir.display()))?;
        }
        // A cloned parent whose submodule was never populated: git checks
        // the gitlink out as an empty directory, and a partial update
        // leaves only hidden entries behind. Pull the existing content
        // instead of re-downloading a template.
        DirState::HiddenOnly => {
            return pull_existing(ops, project_root, &dir, config);
        }
        DirState::Missing | DirState::Empty if registered => {
            return pull_existing(ops, project_root, &dir, config);
        }
        DirState::Missing | DirState::Empty => {}
    }

    template::fetch(template, &dir).context("Failed to fetch knowledge template")?;
    knowledge::write_skeleton(&dir).context("Failed to write knowledge skeleton")?;

    let stored = remote
        .map(str::to_string)
        .or_else(|| non_empty(&config.submodule.repository));
    let url = link_repository(ops, prompt, &dir, template, stored)?;

    // The knowledge path may still be tracked as plain files from an
    // earlier failed run; the index entry must go before submodule add.
    if let Err(e) = ops.remove_cached(project_root, KNOWLEDGE_DIR) {
        tracing::debug!(error = %e, "no stale index entry to remove");
    }
    ops.submodule_add(project_root, &url, KNOWLEDGE_DIR)
        .context("Failed to register knowledge directory as a submodule")?;

    config.submodule.repository = url.clone();
    config.submodule.last_updated = Utc::now().to_rfc3339();
    config.save(&dir)?;

    knowledge::validate(ops, project_root).context("Bootstrap validation failed")?;

    Ok(BootstrapOutcome { url, pulled: false })
}

/// Pull path: the submodule is registered but unpopulated.
fn pull_existing(
    ops: &dyn RepoOps,
    project_root: &Path,
    dir: &Path,
    mut config: Config,
) -> Result<BootstrapOutcome> {
    tracing::info!("knowledge submodule registered but empty, pulling content");

    ops.submodule_update(project_root, KNOWLEDGE_DIR)
        .context("Failed to populate knowledge submodule")?;
    knowledge::validate(ops, project_root).context("Knowledge directory validation failed")?;

    let url = ops
        .remote_url(dir, "origin")?
        .or_else(|| non_empty(&config.submodule.repository))
        .unwrap_or_default();
    if config.submodule.repository != url {
        config.submodule.repository = url.clone();
        config.submodule.last_updated = Utc::now().to_rfc3339();
        config.save(dir)?;
    }

    Ok(BootstrapOutcome { url, pulled: true })
}

/// Runs the link loop: init, commit, add remote, push, resolve.
///
/// A failed attempt keeps the last URL as the next prompt's default
/// rather than discarding it.
fn link_repository(
    ops: &dyn RepoOps,
    prompt: &mut dyn Prompt,
    dir: &Path,
    template: &TemplateSource,
    stored_url: Option<String>,
) -> Result<String> {
    let mut last_url = stored_url.clone();

    for attempt in 1..=LINK_ATTEMPTS {
        // The stored URL is trusted without prompting on the first
        // attempt only; after a failure the user confirms or replaces it.
        let url = match (&stored_url, attempt) {
            (Some(url), 1) => url.clone(),
            _ => prompt.remote_url(last_url.as_deref())?,
        };
        last_url = Some(url.clone());
        tracing::debug!(attempt, %url, "linking knowledge repository");

        match try_link(ops, prompt, dir, template, &url) {
            Ok(LinkResult::Linked) => return Ok(url),
            Ok(LinkResult::Cancelled) => {
                discard_repo_state(dir)?;
                tracing::info!(attempt, "link attempt cancelled, re-prompting for URL");
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "link attempt failed, rebuilding skeleton");
                rebuild_skeleton(dir, template)?;
            }
        }
    }

    bail!("Failed to link knowledge repository after {LINK_ATTEMPTS} attempts")
}

enum LinkResult {
    Linked,
    Cancelled,
}

fn try_link(
    ops: &dyn RepoOps,
    prompt: &mut dyn Prompt,
    dir: &Path,
    template: &TemplateSource,
    url: &str,
) -> Result<LinkResult> {
    ops.init(dir).context("Failed to initialize knowledge repository")?;
    ops.commit_all(dir, "chore: initialize knowledge base")
        .context("Failed to commit knowledge template")?;
    ops.add_remote(dir, "origin", url)
        .context("Failed to add remote")?;

    match ops.push(dir, false) {
        Ok(()) => Ok(LinkResult::Linked),
        Err(RepoError::PushRejected(reason)) => {
            tracing::info!(%reason, "remote already has content");
            match prompt.resolution()? {
                Resolution::Overwrite => {
                    // Pull whatever merges cleanly first; divergent or
                    // unrelated history is the case being overwritten.
                    if let Err(e) = ops.pull(dir) {
                        tracing::debug!(error = %e, "pre-overwrite pull failed, continuing");
                    }
                    ops.push(dir, true).context("Failed to force-push")?;
                    Ok(LinkResult::Linked)
                }
                Resolution::Merge => {
                    merge_existing(ops, dir, template, url)?;
                    Ok(LinkResult::Linked)
                }
                Resolution::Cancel => Ok(LinkResult::Cancelled),
            }
        }
        Err(e) => Err(e).context("Failed to push knowledge repository"),
    }
}

/// Merge resolution: the remote's history becomes the submodule, and the
/// template is folded in on top (see [`merge`]).
fn merge_existing(
    ops: &dyn RepoOps,
    dir: &Path,
    template: &TemplateSource,
    url: &str,
) -> Result<()> {
    fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
    ops.clone(url, dir)
        .with_context(|| format!("Failed to clone {url}"))?;

    let staging = staging_dir();
    let _ = fs::remove_dir_all(&staging);
    template::fetch(template, &staging).context("Failed to re-fetch template for merge")?;

    let copied = merge::merge_template(&staging, dir)
        .context("Failed to merge template into cloned knowledge directory")?;
    let _ = fs::remove_dir_all(&staging);
    tracing::debug!(?copied, "template entries merged");

    knowledge::write_skeleton(dir)?;

    // Nothing new to commit is fine; the remote already had everything.
    if ops.commit_all(dir, "docs: merge knowledge template")? {
        ops.push(dir, false)
            .context("Failed to push merged knowledge repository")?;
    }
    Ok(())
}

/// Drops repository metadata but keeps the template files, so a new
/// attempt with a different URL starts from the same content.
fn discard_repo_state(dir: &Path) -> Result<()> {
    let git_dir = dir.join(".git");
    if git_dir.exists() {
        fs::remove_dir_all(&git_dir)
            .with_context(|| format!("Failed to remove {}", git_dir.display()))?;
    }
    Ok(())
}

/// After an unrecoverable failure the partial directory is deleted and
/// the skeleton rebuilt, so the next attempt (and final validation)
/// starts from known-good content.
fn rebuild_skeleton(dir: &Path, template: &TemplateSource) -> Result<()> {
    let _ = fs::remove_dir_all(dir);
    template::fetch(template, dir).context("Failed to re-fetch knowledge template")?;
    knowledge::write_skeleton(dir)?;
    Ok(())
}

fn staging_dir() -> PathBuf {
    std::env::temp_dir().join(format!("agp-template-{}", std::process::id()))
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The full bootstrap flows run against real repositories in
    // tests/cli_integration.rs; these cover the small pure pieces.

    #[test]
    fn non_empty_filters_blank() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("x"), Some("x".to_string()));
    }

    #[test]
    fn discard_repo_state_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref").unwrap();
        fs::write(dir.path().join("INSTRUCTIONS.md"), "keep me").unwrap();

        discard_repo_state(dir.path()).unwrap();

        assert!(!dir.path().join(".git").exists());
        assert!(dir.path().join("INSTRUCTIONS.md").exists());
    }
}
