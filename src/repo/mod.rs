//! Repository operations.
//!
//! All git effects in the crate go through the [`RepoOps`] trait so the
//! bootstrap and sync orchestration can be exercised against throwaway
//! repositories in tests. The production implementation, [`GitRepoOps`],
//! uses libgit2 via the `git2` crate; nothing shells out to a `git`
//! binary and every operation takes an explicit repository path, so the
//! process working directory is never touched.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    Cred, CredentialType, FetchOptions, IndexAddOption, PushOptions, RemoteCallbacks, Repository,
    Signature, Status, StatusOptions, SubmoduleUpdateOptions,
};
use thiserror::Error;

/// Failures from repository operations.
///
/// Push rejection is its own variant because the bootstrap flow treats a
/// non-empty remote as a negotiable condition rather than an error.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The remote refused the push, typically because it already has
    /// history the local repository does not.
    #[error("push rejected by remote: {0}")]
    PushRejected(String),

    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// One line of short status output, e.g. `M sessions/alice/index.md`.
pub type StatusLine = String;

/// The repository operations the tool needs, path-explicit throughout.
pub trait RepoOps {
    /// Whether a repository exists at `path`.
    fn is_repo(&self, path: &Path) -> bool;

    /// Initializes a new repository at `path`.
    fn init(&self, path: &Path) -> Result<(), RepoError>;

    /// Clones `url` into `path`.
    fn clone(&self, url: &str, path: &Path) -> Result<(), RepoError>;

    /// Stages everything and commits. Returns `false` when the working
    /// tree matches HEAD and no commit was created.
    fn commit_all(&self, path: &Path, message: &str) -> Result<bool, RepoError>;

    /// Commits whatever is currently staged. Returns `false` when the
    /// index matches HEAD.
    fn commit_staged(&self, path: &Path, message: &str) -> Result<bool, RepoError>;

    /// Adds a named remote.
    fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<(), RepoError>;

    /// Changes the URL of an existing remote.
    fn set_remote_url(&self, path: &Path, name: &str, url: &str) -> Result<(), RepoError>;

    /// Returns the URL of a named remote, if configured.
    fn remote_url(&self, path: &Path, name: &str) -> Result<Option<String>, RepoError>;

    /// Pushes the current branch to `origin`.
    fn push(&self, path: &Path, force: bool) -> Result<(), RepoError>;

    /// Fetches and merges the current branch from `origin`.
    fn pull(&self, path: &Path) -> Result<(), RepoError>;

    /// Short status of the working tree, ignored files excluded.
    fn status_short(&self, path: &Path) -> Result<Vec<StatusLine>, RepoError>;

    /// Stages one pathspec.
    fn stage(&self, path: &Path, pathspec: &str) -> Result<(), RepoError>;

    /// Drops an entry from the index without touching the working tree.
    fn remove_cached(&self, path: &Path, entry: &str) -> Result<(), RepoError>;

    /// Registers `entry` as a submodule of the repository at `path`,
    /// pointing at `url`, and stages the result.
    fn submodule_add(&self, path: &Path, url: &str, entry: &str) -> Result<(), RepoError>;

    /// Initializes and updates an already-registered submodule.
    fn submodule_update(&self, path: &Path, entry: &str) -> Result<(), RepoError>;

    /// Rewrites the recorded URL of a registered submodule.
    fn submodule_set_url(&self, path: &Path, entry: &str, url: &str) -> Result<(), RepoError>;

    /// Returns the commit id tracked for a submodule entry, or `None`
    /// when no such submodule is registered.
    fn submodule_head(&self, path: &Path, entry: &str) -> Result<Option<String>, RepoError>;
}

/// libgit2-backed implementation of [`RepoOps`].
#[derive(Debug, Default, Clone, Copy)]
pub struct GitRepoOps;

impl GitRepoOps {
    pub fn new() -> Self {
        Self
    }
}

/// Finds the repository containing `start` and returns its working
/// directory, which the tool treats as the project root.
pub fn discover_project_root(start: &Path) -> Result<PathBuf, RepoError> {
    let repo = Repository::discover(start)?;
    let workdir = repo
        .workdir()
        .ok_or_else(|| git2::Error::from_str("repository has no working directory"))?;
    Ok(workdir.to_path_buf())
}

/// Credential callback covering ssh-agent, helper-configured HTTPS
/// credentials, and the anonymous default (file-path remotes).
fn credentials(
    url: &str,
    username: Option<&str>,
    allowed: CredentialType,
) -> Result<Cred, git2::Error> {
    if allowed.contains(CredentialType::SSH_KEY) {
        return Cred::ssh_key_from_agent(username.unwrap_or("git"));
    }
    if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
        let config = git2::Config::open_default()?;
        return Cred::credential_helper(&config, url, username);
    }
    Cred::default()
}

fn fetch_options<'a>() -> FetchOptions<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(credentials);
    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    options
}

fn signature(repo: &Repository) -> Result<Signature<'static>, git2::Error> {
    repo.signature()
        .or_else(|_| Signature::now("agp", "agp@localhost"))
}

fn head_branch(repo: &Repository) -> Result<String, git2::Error> {
    let head = repo.head()?;
    Ok(head.shorthand().unwrap_or("master").to_string())
}

/// Maps a status bitset to the two-letter codes the sync layer buckets on.
fn short_code(status: Status) -> &'static str {
    if status.intersects(Status::WT_NEW) {
        "??"
    } else if status.intersects(Status::INDEX_NEW) {
        "A"
    } else if status.intersects(Status::WT_DELETED | Status::INDEX_DELETED) {
        "D"
    } else if status.intersects(Status::WT_RENAMED | Status::INDEX_RENAMED) {
        "R"
    } else {
        "M"
    }
}

impl RepoOps for GitRepoOps {
    fn is_repo(&self, path: &Path) -> bool {
        Repository::open(path).is_ok()
    }

    fn init(&self, path: &Path) -> Result<(), RepoError> {
        Repository::init(path)?;
        Ok(())
    }

    fn clone(&self, url: &str, path: &Path) -> Result<(), RepoError> {
        RepoBuilder::new()
            .fetch_options(fetch_options())
            .clone(url, path)?;
        Ok(())
    }

    fn commit_all(&self, path: &Path, message: &str) -> Result<bool, RepoError> {
        let repo = Repository::open(path)?;
        let mut index = repo.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.write()?;
        commit_index(&repo, message)
    }

    fn commit_staged(&self, path: &Path, message: &str) -> Result<bool, RepoError> {
        let repo = Repository::open(path)?;
        commit_index(&repo, message)
    }

    fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<(), RepoError> {
        let repo = Repository::open(path)?;
        repo.remote(name, url)?;
        Ok(())
    }

    fn set_remote_url(&self, path: &Path, name: &str, url: &str) -> Result<(), RepoError> {
        let repo = Repository::open(path)?;
        repo.remote_set_url(name, url)?;
        Ok(())
    }

    fn remote_url(&self, path: &Path, name: &str) -> Result<Option<String>, RepoError> {
        let repo = Repository::open(path)?;
        let url = repo
            .find_remote(name)
            .ok()
            .and_then(|remote| remote.url().map(String::from));
        Ok(url)
    }

    fn push(&self, path: &Path, force: bool) -> Result<(), RepoError> {
        let repo = Repository::open(path)?;
        let branch = head_branch(&repo)?;
        let mut remote = repo.find_remote("origin")?;

        let rejected: RefCell<Option<String>> = RefCell::new(None);
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(credentials);
        callbacks.push_update_reference(|refname, status| {
            if let Some(message) = status {
                *rejected.borrow_mut() = Some(format!("{refname}: {message}"));
            }
            Ok(())
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        let refspec = if force {
            format!("+refs/heads/{branch}:refs/heads/{branch}")
        } else {
            format!("refs/heads/{branch}:refs/heads/{branch}")
        };

        let result = remote.push(&[refspec.as_str()], Some(&mut options));

        if let Some(message) = rejected.borrow_mut().take() {
            return Err(RepoError::PushRejected(message));
        }
        if let Err(e) = result {
            if e.code() == git2::ErrorCode::NotFastForward {
                return Err(RepoError::PushRejected(e.message().to_string()));
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn pull(&self, path: &Path) -> Result<(), RepoError> {
        let repo = Repository::open(path)?;
        let branch = head_branch(&repo)?;

        let mut remote = repo.find_remote("origin")?;
        remote.fetch(&[branch.as_str()], Some(&mut fetch_options()), None)?;

        let fetch_head = repo.find_reference("FETCH_HEAD")?;
        let fetched = repo.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = repo.merge_analysis(&[&fetched])?;

        if analysis.is_up_to_date() {
            return Ok(());
        }

        if analysis.is_fast_forward() {
            let refname = format!("refs/heads/{branch}");
            let mut reference = repo.find_reference(&refname)?;
            reference.set_target(fetched.id(), "pull: fast-forward")?;
            repo.set_head(&refname)?;
            let mut checkout = CheckoutBuilder::new();
            checkout.force();
            repo.checkout_head(Some(&mut checkout))?;
            return Ok(());
        }

        repo.merge(&[&fetched], None, None)?;
        if repo.index()?.has_conflicts() {
            // Abort cleanly: callers that ignore a failed pull must not
            // inherit conflict markers in the working tree.
            let head = repo.head()?.peel_to_commit()?;
            repo.reset(head.as_object(), git2::ResetType::Hard, None)?;
            repo.cleanup_state()?;
            return Err(git2::Error::from_str("merge produced conflicts").into());
        }

        let mut index = repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;
        let sig = signature(&repo)?;
        let local = repo.head()?.peel_to_commit()?;
        let remote_commit = repo.find_commit(fetched.id())?;
        repo.commit(
            Some("HEAD"),
            &sig,
            &sig,
            "merge remote history",
            &tree,
            &[&local, &remote_commit],
        )?;
        repo.cleanup_state()?;
        Ok(())
    }

    fn status_short(&self, path: &Path) -> Result<Vec<StatusLine>, RepoError> {
        let repo = Repository::open(path)?;
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = repo.statuses(Some(&mut options))?;
        let mut lines = Vec::new();
        for entry in statuses.iter() {
            let status = entry.status();
            if status.intersects(Status::IGNORED) {
                continue;
            }
            if let Some(p) = entry.path() {
                lines.push(format!("{} {}", short_code(status), p));
            }
        }
        Ok(lines)
    }

    fn stage(&self, path: &Path, pathspec: &str) -> Result<(), RepoError> {
        let repo = Repository::open(path)?;
        let mut index = repo.index()?;
        index.add_all([pathspec], IndexAddOption::DEFAULT, None)?;
        index.write()?;
        Ok(())
    }

    fn remove_cached(&self, path: &Path, entry: &str) -> Result<(), RepoError> {
        let repo = Repository::open(path)?;
        let mut index = repo.index()?;
        index.remove_all([entry], None)?;
        index.write()?;
        Ok(())
    }

    fn submodule_add(&self, path: &Path, url: &str, entry: &str) -> Result<(), RepoError> {
        let mut repo = Repository::open(path)?;
        let err = match repo.submodule(url, Path::new(entry), true) {
            Ok(mut submodule) => {
                submodule.add_finalize()?;
                return Ok(());
            }
            Err(e) => e,
        };
        if err.code() != git2::ErrorCode::Exists {
            return Err(err.into());
        }

        // Already registered from an earlier run: refresh the URL and
        // restage the gitlink from the submodule's current HEAD.
        repo.submodule_set_url(entry, url)?;
        let mut submodule = repo.find_submodule(entry)?;
        submodule.add_to_index(true)?;
        Ok(())
    }

    fn submodule_update(&self, path: &Path, entry: &str) -> Result<(), RepoError> {
        let repo = Repository::open(path)?;
        let mut submodule = repo.find_submodule(entry)?;
        let mut options = SubmoduleUpdateOptions::new();
        options.fetch(fetch_options());
        submodule.update(true, Some(&mut options))?;
        Ok(())
    }

    fn submodule_set_url(&self, path: &Path, entry: &str, url: &str) -> Result<(), RepoError> {
        let mut repo = Repository::open(path)?;
        repo.submodule_set_url(entry, url)?;
        Ok(())
    }

    fn submodule_head(&self, path: &Path, entry: &str) -> Result<Option<String>, RepoError> {
        let repo = Repository::open(path)?;
        let head = match repo.find_submodule(entry) {
            Ok(submodule) => submodule
                .index_id()
                .or_else(|| submodule.head_id())
                .or_else(|| submodule.workdir_id())
                .map(|id| id.to_string()),
            Err(_) => None,
        };
        Ok(head)
    }
}

/// Commits the current index onto HEAD, skipping empty commits.
fn commit_index(repo: &Repository, message: &str) -> Result<bool, RepoError> {
    let mut index = repo.index()?;
    let tree_id = index.write_tree()?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(_) => None,
    };
    if let Some(ref p) = parent {
        if p.tree_id() == tree_id {
            return Ok(false);
        }
    }

    let tree = repo.find_tree(tree_id)?;
    let sig = signature(repo)?;
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(path: &Path, name: &str, content: &str) {
        fs::write(path.join(name), content).unwrap();
    }

    #[test]
    fn init_commit_and_status() {
        let dir = tempdir().unwrap();
        let ops = GitRepoOps::new();
        ops.init(dir.path()).unwrap();

        write(dir.path(), "a.md", "hello");
        assert_eq!(ops.status_short(dir.path()).unwrap(), vec!["?? a.md"]);

        assert!(ops.commit_all(dir.path(), "first").unwrap());
        assert!(ops.status_short(dir.path()).unwrap().is_empty());

        // Nothing changed, so no second commit is created.
        assert!(!ops.commit_all(dir.path(), "again").unwrap());
    }

    #[test]
    fn status_respects_ignore_rules() {
        let dir = tempdir().unwrap();
        let ops = GitRepoOps::new();
        ops.init(dir.path()).unwrap();

        write(dir.path(), ".gitignore", "config.json\n");
        write(dir.path(), "config.json", "{}");
        ops.commit_all(dir.path(), "ignore rules").unwrap();

        assert!(ops.status_short(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn push_to_file_remote_and_reject_non_fast_forward() {
        let base = tempdir().unwrap();
        let remote_path = base.path().join("remote.git");
        Repository::init_bare(&remote_path).unwrap();
        let remote_url = remote_path.to_string_lossy().to_string();

        let ops = GitRepoOps::new();

        // First clone pushes fine.
        let a = base.path().join("a");
        ops.init(&a).unwrap();
        write(&a, "one.md", "1");
        ops.commit_all(&a, "one").unwrap();
        ops.add_remote(&a, "origin", &remote_url).unwrap();
        ops.push(&a, false).unwrap();

        // A second, unrelated repository is rejected without force.
        let b = base.path().join("b");
        ops.init(&b).unwrap();
        write(&b, "two.md", "2");
        ops.commit_all(&b, "two").unwrap();
        ops.add_remote(&b, "origin", &remote_url).unwrap();
        match ops.push(&b, false) {
            Err(RepoError::PushRejected(_)) => {}
            other => panic!("expected PushRejected, got {other:?}"),
        }

        // Force push wins.
        ops.push(&b, true).unwrap();
    }

    #[test]
    fn remote_url_roundtrip() {
        let dir = tempdir().unwrap();
        let ops = GitRepoOps::new();
        ops.init(dir.path()).unwrap();

        assert!(ops.remote_url(dir.path(), "origin").unwrap().is_none());
        ops.add_remote(dir.path(), "origin", "https://example.com/k.git")
            .unwrap();
        assert_eq!(
            ops.remote_url(dir.path(), "origin").unwrap().as_deref(),
            Some("https://example.com/k.git")
        );

        ops.set_remote_url(dir.path(), "origin", "https://example.com/other.git")
            .unwrap();
        assert_eq!(
            ops.remote_url(dir.path(), "origin").unwrap().as_deref(),
            Some("https://example.com/other.git")
        );
    }

    #[test]
    fn submodule_add_twice_refreshes_url_and_keeps_one_entry() {
        let base = tempdir().unwrap();
        let ops = GitRepoOps::new();

        let parent = base.path().join("parent");
        ops.init(&parent).unwrap();
        write(&parent, "README.md", "# project");
        ops.commit_all(&parent, "initial").unwrap();

        let sub = parent.join("knowledge");
        ops.init(&sub).unwrap();
        write(&sub, "a.md", "a");
        ops.commit_all(&sub, "content").unwrap();

        assert!(ops.submodule_head(&parent, "knowledge").unwrap().is_none());
        ops.submodule_add(&parent, "/remotes/first.git", "knowledge")
            .unwrap();
        assert!(ops.submodule_head(&parent, "knowledge").unwrap().is_some());

        // A second add must not fail; it rewrites the URL in place.
        ops.submodule_add(&parent, "/remotes/second.git", "knowledge")
            .unwrap();

        let repo = Repository::open(&parent).unwrap();
        let submodules = repo.submodules().unwrap();
        assert_eq!(submodules.len(), 1);
        assert_eq!(submodules[0].url(), Some("/remotes/second.git"));
    }

    #[test]
    fn short_code_mapping() {
        assert_eq!(short_code(Status::WT_NEW), "??");
        assert_eq!(short_code(Status::INDEX_NEW), "A");
        assert_eq!(short_code(Status::WT_MODIFIED), "M");
        assert_eq!(short_code(Status::WT_DELETED), "D");
    }

    #[test]
    fn discover_finds_workdir() {
        let dir = tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("src");
        fs::create_dir_all(&nested).unwrap();

        let root = discover_project_root(&nested).unwrap();
        assert_eq!(
            root.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }
}
