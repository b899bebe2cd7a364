//! # Working-Copy Synchronization
//!
//! This module provides the `RepositoryManager`, which makes sure a local
//! working copy mirrors the latest commit of a remote branch. It is the only
//! component that mutates a working copy.
//!
//! ## State machine
//!
//! A working copy at the target path is in one of three states:
//!
//! - **Absent**: the directory does not exist or is empty. It is filled with
//!   a depth-1 clone, restricted to the configured branch if there is one.
//! - **PresentMatching**: the directory holds a repository whose `origin`
//!   equals the configured remote (both sides trimmed, local paths compared
//!   by canonical location). The target ref is
//!   resolved (`origin/<branch>`, or the remote's advertised default branch
//!   via `refs/remotes/origin/HEAD`), a depth-1 fetch runs, and the working
//!   tree is hard-reset to the target. Local edits are discarded: the copy
//!   is a disposable mirror.
//! - **PresentMismatched**: anything else. Synchronization fails with a
//!   `SyncConflict` error naming the path, and nothing on disk is touched.
//!   Clearing the directory is the caller's job.
//!
//! ## Design
//!
//! Git access goes through the [`GitOperations`] trait so the state machine
//! can be exercised against a fake in tests. [`DefaultGitOperations`] wraps
//! the system `git` binary. Every git call is blocking and awaited in
//! sequence; failures propagate unchanged and are never retried here.
//!
//! Two overlapping syncs of the same path are unsafe; callers serialize runs
//! per source name.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::error::{Error, Result};

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Shallow (depth 1) clone of `url` into `target_dir`, optionally
    /// restricted to `branch`.
    fn clone_shallow(&self, url: &str, branch: Option<&str>, target_dir: &Path) -> Result<()>;

    /// Depth-1 fetch from `origin`, updating `origin/<branch>` when a branch
    /// is given.
    fn fetch_shallow(&self, repo: &Path, branch: Option<&str>) -> Result<()>;

    /// Hard reset of the working tree and index to `target`.
    fn reset_hard(&self, repo: &Path, target: &str) -> Result<()>;

    /// The configured URL of the default remote.
    fn remote_url(&self, repo: &Path) -> Result<String>;

    /// The remote's default branch, e.g. `origin/main`.
    fn default_branch(&self, repo: &Path) -> Result<String>;

    /// Short name of the checked-out ref.
    fn current_ref(&self, repo: &Path) -> Result<String>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real Git operations.
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn clone_shallow(&self, url: &str, branch: Option<&str>, target_dir: &Path) -> Result<()> {
        crate::git::clone_shallow(url, branch, target_dir)
    }

    fn fetch_shallow(&self, repo: &Path, branch: Option<&str>) -> Result<()> {
        crate::git::fetch_shallow(repo, branch)
    }

    fn reset_hard(&self, repo: &Path, target: &str) -> Result<()> {
        crate::git::reset_hard(repo, target)
    }

    fn remote_url(&self, repo: &Path) -> Result<String> {
        crate::git::remote_url(repo)
    }

    fn default_branch(&self, repo: &Path) -> Result<String> {
        crate::git::default_branch(repo)
    }

    fn current_ref(&self, repo: &Path) -> Result<String> {
        crate::git::current_ref(repo)
    }
}

/// Which branch a working copy follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchSpec {
    /// Whatever the remote advertises as its default branch.
    Default,
    /// A concrete branch name.
    Named(String),
}

impl BranchSpec {
    pub fn name(&self) -> Option<&str> {
        match self {
            BranchSpec::Default => None,
            BranchSpec::Named(name) => Some(name),
        }
    }
}

/// Everything needed to synchronize one working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    pub local_path: PathBuf,
    /// Trimmed by [`SyncTarget::new`]; clone and comparison see the same URL.
    pub remote_url: String,
    pub branch: BranchSpec,
}

impl SyncTarget {
    pub fn new(local_path: impl Into<PathBuf>, remote_url: impl Into<String>, branch: BranchSpec) -> Self {
        Self {
            local_path: local_path.into(),
            remote_url: remote_url.into().trim().to_string(),
            branch,
        }
    }
}

/// Observed state of the directory at a sync target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkingCopyState {
    Absent,
    PresentMatching,
    PresentMismatched {
        /// The origin that was found, if one could be read.
        found: Option<String>,
    },
}

/// How a successful sync left the working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A fresh shallow clone was made.
    Cloned,
    /// An existing copy was fetched and hard-reset to `target`.
    Updated { target: String },
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Cloned => f.write_str("cloned"),
            SyncOutcome::Updated { target } => write!(f, "updated to {}", target),
        }
    }
}

/// Keeps working copies in step with their remotes.
pub struct RepositoryManager {
    git_ops: Arc<dyn GitOperations>,
}

impl RepositoryManager {
    /// Creates a `RepositoryManager` backed by the system `git` binary.
    pub fn new() -> Self {
        Self {
            git_ops: Arc::new(DefaultGitOperations),
        }
    }

    /// Creates a `RepositoryManager` with a custom `GitOperations`
    /// implementation, typically a fake used in tests.
    pub fn with_operations(git_ops: Arc<dyn GitOperations>) -> Self {
        Self { git_ops }
    }

    /// The git backend, shared with read-only consumers such as remote
    /// metadata resolution.
    pub fn git_ops(&self) -> &dyn GitOperations {
        self.git_ops.as_ref()
    }

    /// Classifies the directory at `target.local_path` without mutating it.
    pub fn inspect(&self, target: &SyncTarget) -> Result<WorkingCopyState> {
        let path = &target.local_path;
        if !path.exists() || fs::read_dir(path)?.next().is_none() {
            return Ok(WorkingCopyState::Absent);
        }

        if !path.join(".git").exists() {
            return Ok(WorkingCopyState::PresentMismatched { found: None });
        }

        match self.git_ops.remote_url(path) {
            Ok(found) if same_remote(&found, &target.remote_url) => {
                Ok(WorkingCopyState::PresentMatching)
            }
            Ok(found) => Ok(WorkingCopyState::PresentMismatched {
                found: Some(found.trim().to_string()),
            }),
            Err(e) => {
                debug!("could not read origin of {}: {}", path.display(), e);
                Ok(WorkingCopyState::PresentMismatched { found: None })
            }
        }
    }

    /// Brings the working copy to the tip of the target branch.
    pub fn sync(&self, target: &SyncTarget) -> Result<SyncOutcome> {
        let path = &target.local_path;
        let branch = target.branch.name();

        match self.inspect(target)? {
            WorkingCopyState::Absent => {
                info!(
                    "cloning {} into {} (depth 1{})",
                    target.remote_url,
                    path.display(),
                    branch.map(|b| format!(", branch {}", b)).unwrap_or_default()
                );
                self.git_ops.clone_shallow(&target.remote_url, branch, path)?;
                Ok(SyncOutcome::Cloned)
            }
            WorkingCopyState::PresentMatching => {
                let target_ref = self.target_ref(path, &target.branch)?;
                info!("updating {} to {}", path.display(), target_ref);
                self.git_ops.fetch_shallow(path, branch)?;
                self.git_ops.reset_hard(path, &target_ref)?;
                Ok(SyncOutcome::Updated { target: target_ref })
            }
            WorkingCopyState::PresentMismatched { found } => Err(Error::SyncConflict {
                path: path.clone(),
                expected: target.remote_url.trim().to_string(),
                found,
            }),
        }
    }

    fn target_ref(&self, path: &Path, branch: &BranchSpec) -> Result<String> {
        match branch {
            BranchSpec::Named(name) => Ok(format!("origin/{}", name)),
            BranchSpec::Default => Ok(self.git_ops.default_branch(path)?.trim().to_string()),
        }
    }
}

impl Default for RepositoryManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether an origin read from a working copy names the configured remote.
///
/// git records local clone sources as absolute paths, so local remotes are
/// compared by their canonical location rather than by spelling.
fn same_remote(found: &str, expected: &str) -> bool {
    let (found, expected) = (found.trim(), expected.trim());
    if found == expected {
        return true;
    }
    match (local_repository(found), local_repository(expected)) {
        (Some(found), Some(expected)) => {
            match (fs::canonicalize(found), fs::canonicalize(expected)) {
                (Ok(found), Ok(expected)) => found == expected,
                _ => false,
            }
        }
        _ => false,
    }
}

fn local_repository(remote: &str) -> Option<&Path> {
    if let Some(path) = remote.strip_prefix("file://") {
        return Some(Path::new(path));
    }
    if remote.contains("://") {
        return None;
    }
    let path = Path::new(remote);
    (path.is_absolute() || remote.starts_with("./") || remote.starts_with("../")).then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Clone(String, Option<String>),
        Fetch(Option<String>),
        Reset(String),
        RemoteUrl,
        DefaultBranch,
    }

    /// Mock git operations for testing
    struct MockGitOperations {
        calls: Mutex<Vec<Call>>,
        origin: String,
        default_branch: String,
        fail_clone: Option<String>,
        fail_fetch: bool,
    }

    impl MockGitOperations {
        fn new(origin: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                origin: origin.to_string(),
                default_branch: "origin/main".to_string(),
                fail_clone: None,
                fail_fetch: false,
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl GitOperations for MockGitOperations {
        fn clone_shallow(&self, url: &str, branch: Option<&str>, target_dir: &Path) -> Result<()> {
            self.record(Call::Clone(url.to_string(), branch.map(String::from)));
            if let Some(message) = &self.fail_clone {
                return Err(Error::GitClone {
                    url: url.to_string(),
                    branch: branch.unwrap_or("HEAD").to_string(),
                    message: message.clone(),
                    hint: None,
                });
            }
            fs::create_dir_all(target_dir.join(".git")).unwrap();
            fs::write(target_dir.join("README.md"), "# cloned").unwrap();
            Ok(())
        }

        fn fetch_shallow(&self, _repo: &Path, branch: Option<&str>) -> Result<()> {
            self.record(Call::Fetch(branch.map(String::from)));
            if self.fail_fetch {
                return Err(Error::GitCommand {
                    command: "fetch --depth 1 origin".to_string(),
                    path: PathBuf::new(),
                    stderr: "fatal: unable to access remote".to_string(),
                });
            }
            Ok(())
        }

        fn reset_hard(&self, _repo: &Path, target: &str) -> Result<()> {
            self.record(Call::Reset(target.to_string()));
            Ok(())
        }

        fn remote_url(&self, _repo: &Path) -> Result<String> {
            self.record(Call::RemoteUrl);
            Ok(format!("{}\n", self.origin))
        }

        fn default_branch(&self, _repo: &Path) -> Result<String> {
            self.record(Call::DefaultBranch);
            Ok(format!("{}\n", self.default_branch))
        }

        fn current_ref(&self, _repo: &Path) -> Result<String> {
            Ok("main".to_string())
        }
    }

    const REMOTE: &str = "https://example.com/org/repo.git";

    fn manager(mock: MockGitOperations) -> (RepositoryManager, Arc<MockGitOperations>) {
        let mock = Arc::new(mock);
        (RepositoryManager::with_operations(mock.clone()), mock)
    }

    fn existing_copy(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("blog");
        fs::create_dir_all(path.join(".git")).unwrap();
        fs::write(path.join("post.md"), "local edit").unwrap();
        path
    }

    #[test]
    fn test_absent_directory_is_cloned() {
        let dir = TempDir::new().unwrap();
        let (manager, mock) = manager(MockGitOperations::new(REMOTE));
        let target = SyncTarget::new(dir.path().join("blog"), REMOTE, BranchSpec::Default);

        assert_eq!(manager.sync(&target).unwrap(), SyncOutcome::Cloned);
        assert_eq!(mock.calls(), vec![Call::Clone(REMOTE.to_string(), None)]);
    }

    #[test]
    fn test_empty_directory_is_cloned_with_branch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blog");
        fs::create_dir_all(&path).unwrap();
        let (manager, mock) = manager(MockGitOperations::new(REMOTE));
        let target = SyncTarget::new(&path, REMOTE, BranchSpec::Named("gh-pages".to_string()));

        assert_eq!(manager.sync(&target).unwrap(), SyncOutcome::Cloned);
        assert_eq!(
            mock.calls(),
            vec![Call::Clone(REMOTE.to_string(), Some("gh-pages".to_string()))]
        );
    }

    #[test]
    fn test_matching_copy_is_fetched_and_reset_to_named_branch() {
        let dir = TempDir::new().unwrap();
        let path = existing_copy(&dir);
        let (manager, mock) = manager(MockGitOperations::new(REMOTE));
        let target = SyncTarget::new(&path, REMOTE, BranchSpec::Named("dev".to_string()));

        let outcome = manager.sync(&target).unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Updated {
                target: "origin/dev".to_string()
            }
        );
        assert_eq!(
            mock.calls(),
            vec![
                Call::RemoteUrl,
                Call::Fetch(Some("dev".to_string())),
                Call::Reset("origin/dev".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_branch_comes_from_remote_head() {
        let dir = TempDir::new().unwrap();
        let path = existing_copy(&dir);
        let mut mock = MockGitOperations::new(REMOTE);
        mock.default_branch = "origin/trunk".to_string();
        let (manager, mock) = manager(mock);
        let target = SyncTarget::new(&path, REMOTE, BranchSpec::Default);

        let outcome = manager.sync(&target).unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Updated {
                target: "origin/trunk".to_string()
            }
        );
        assert_eq!(
            mock.calls(),
            vec![
                Call::RemoteUrl,
                Call::DefaultBranch,
                Call::Fetch(None),
                Call::Reset("origin/trunk".to_string()),
            ]
        );
    }

    #[test]
    fn test_repeated_sync_never_reclones() {
        let dir = TempDir::new().unwrap();
        let (manager, mock) = manager(MockGitOperations::new(REMOTE));
        let target = SyncTarget::new(dir.path().join("blog"), REMOTE, BranchSpec::Default);

        assert_eq!(manager.sync(&target).unwrap(), SyncOutcome::Cloned);
        let second = manager.sync(&target).unwrap();
        let third = manager.sync(&target).unwrap();
        assert_eq!(second, third);

        let clones = mock
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Clone(..)))
            .count();
        let resets = mock
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Reset(..)))
            .count();
        assert_eq!(clones, 1);
        assert_eq!(resets, 2);
    }

    #[test]
    fn test_remote_comparison_is_trimmed() {
        let dir = TempDir::new().unwrap();
        let path = existing_copy(&dir);
        let (manager, _mock) = manager(MockGitOperations::new(REMOTE));
        let target = SyncTarget::new(&path, format!("  {} ", REMOTE), BranchSpec::Default);

        assert_eq!(
            manager.inspect(&target).unwrap(),
            WorkingCopyState::PresentMatching
        );
    }

    #[test]
    fn test_local_remote_matches_recorded_absolute_path() {
        let dir = TempDir::new().unwrap();
        let bare = dir.path().join("remote.git");
        fs::create_dir_all(&bare).unwrap();
        let recorded = bare.display().to_string();

        assert!(same_remote(&recorded, &format!("{}/../remote.git/", bare.display())));
        assert!(same_remote(&recorded, &format!("file://{}", recorded)));
        assert!(!same_remote(&recorded, "https://example.com/org/remote.git"));
        assert!(!same_remote(&recorded, &dir.path().join("missing.git").display().to_string()));
    }

    #[test]
    fn test_clone_receives_trimmed_remote() {
        let dir = TempDir::new().unwrap();
        let (manager, mock) = manager(MockGitOperations::new(REMOTE));
        let target = SyncTarget::new(
            dir.path().join("blog"),
            format!("\t{}  \n", REMOTE),
            BranchSpec::Default,
        );

        assert_eq!(target.remote_url, REMOTE);
        manager.sync(&target).unwrap();
        assert_eq!(mock.calls(), vec![Call::Clone(REMOTE.to_string(), None)]);
    }

    #[test]
    fn test_mismatched_remote_fails_without_mutation() {
        let dir = TempDir::new().unwrap();
        let path = existing_copy(&dir);
        let (manager, mock) = manager(MockGitOperations::new("https://example.com/other/repo.git"));
        let target = SyncTarget::new(&path, REMOTE, BranchSpec::Default);

        let err = manager.sync(&target).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyncConflict);
        assert!(err.to_string().contains(&path.display().to_string()));
        assert_eq!(mock.calls(), vec![Call::RemoteUrl]);
        assert_eq!(fs::read_to_string(path.join("post.md")).unwrap(), "local edit");
    }

    #[test]
    fn test_non_repository_directory_is_a_conflict() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blog");
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("notes.txt"), "not a clone").unwrap();
        let (manager, mock) = manager(MockGitOperations::new(REMOTE));
        let target = SyncTarget::new(&path, REMOTE, BranchSpec::Default);

        match manager.sync(&target).unwrap_err() {
            Error::SyncConflict { found, .. } => assert_eq!(found, None),
            other => panic!("expected SyncConflict, got {:?}", other),
        }
        assert!(mock.calls().is_empty());
        assert!(path.join("notes.txt").exists());
    }

    #[test]
    fn test_clone_error_propagates() {
        let dir = TempDir::new().unwrap();
        let mut mock = MockGitOperations::new(REMOTE);
        mock.fail_clone = Some("Remote branch nope not found in upstream origin".to_string());
        let (manager, _mock) = manager(mock);
        let target = SyncTarget::new(
            dir.path().join("blog"),
            REMOTE,
            BranchSpec::Named("nope".to_string()),
        );

        let err = manager.sync(&target).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_fetch_error_skips_reset() {
        let dir = TempDir::new().unwrap();
        let path = existing_copy(&dir);
        let mut mock = MockGitOperations::new(REMOTE);
        mock.fail_fetch = true;
        let (manager, mock) = manager(mock);
        let target = SyncTarget::new(&path, REMOTE, BranchSpec::Named("main".to_string()));

        let err = manager.sync(&target).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(!mock.calls().iter().any(|c| matches!(c, Call::Reset(_))));
    }

    #[test]
    fn test_sync_outcome_display() {
        assert_eq!(SyncOutcome::Cloned.to_string(), "cloned");
        assert_eq!(
            SyncOutcome::Updated {
                target: "origin/main".to_string()
            }
            .to_string(),
            "updated to origin/main"
        );
    }
}
