//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! #[cfg_attr(not(feature = "integration-tests"), ignore)]
//! fn test_example() {
//!     let remote = LocalRemote::new(&[("README.md", "# hi")]);
//!     let fixture = TestFixture::new().with_config(&remote.source_yaml("blog", None));
//!     fixture.command().arg("sync").assert().success();
//! }
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use assert_fs::prelude::*;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{LocalRemote, TestFixture};
}

/// Runs `git` in `dir` with a fixed identity, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=Test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A bare repository on disk plus the seed clone used to push to it.
pub struct LocalRemote {
    dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl LocalRemote {
    /// A remote whose default branch is `main`, holding `files`.
    pub fn new(files: &[(&str, &str)]) -> Self {
        Self::with_default_branch("main", files)
    }

    pub fn with_default_branch(branch: &str, files: &[(&str, &str)]) -> Self {
        let dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        let seed = dir.path().join("seed");
        std::fs::create_dir_all(&seed).unwrap();
        git(&seed, &["init", "-q"]);
        git(
            &seed,
            &["symbolic-ref", "HEAD", &format!("refs/heads/{}", branch)],
        );

        let remote = Self { dir };
        remote.commit(files, "initial");
        git(
            remote.dir.path(),
            &["clone", "-q", "--bare", "seed", "remote.git"],
        );
        git(&seed, &["remote", "add", "origin", "../remote.git"]);
        remote
    }

    fn seed(&self) -> PathBuf {
        self.dir.path().join("seed")
    }

    pub fn bare_path(&self) -> PathBuf {
        self.dir.path().join("remote.git")
    }

    /// `file://` URL of the bare repository. Shallow clones only honour
    /// `--depth` for URLs, not plain paths.
    pub fn url(&self) -> String {
        format!("file://{}", self.bare_path().display())
    }

    fn commit(&self, files: &[(&str, &str)], message: &str) {
        let seed = self.seed();
        for (path, content) in files {
            let file = seed.join(path);
            std::fs::create_dir_all(file.parent().unwrap()).unwrap();
            std::fs::write(file, content).unwrap();
        }
        git(&seed, &["add", "-A"]);
        git(&seed, &["commit", "-q", "-m", message]);
    }

    /// Commits `files` on the current seed branch and pushes it.
    pub fn push(&self, files: &[(&str, &str)], message: &str) {
        self.commit(files, message);
        git(&self.seed(), &["push", "-q", "origin", "HEAD"]);
    }

    /// Creates `branch` from the current commit, adds `files` and pushes it.
    pub fn push_branch(&self, branch: &str, files: &[(&str, &str)]) {
        let seed = self.seed();
        let current = git(&seed, &["rev-parse", "--abbrev-ref", "HEAD"]);
        git(&seed, &["checkout", "-q", "-b", branch]);
        self.commit(files, &format!("work on {}", branch));
        git(&seed, &["push", "-q", "origin", branch]);
        git(&seed, &["checkout", "-q", &current]);
    }

    /// A one-source configuration for this remote.
    pub fn source_yaml(&self, name: &str, patterns: Option<&str>) -> String {
        let mut yaml = format!("- name: {}\n  remote: {}\n", name, self.url());
        if let Some(patterns) = patterns {
            yaml.push_str(&format!("  patterns: {}\n", patterns));
        }
        yaml
    }
}

/// A temporary project directory with its own cache directory.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `.git-source.yaml` configuration file with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child(".git-source.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join(".git-source.yaml")
    }

    /// The cache directory every command of this fixture uses.
    pub fn cache_dir(&self) -> PathBuf {
        self.temp_dir.path().join("cache")
    }

    /// Working copy of `name` inside the fixture's cache.
    pub fn working_copy(&self, name: &str) -> PathBuf {
        self.cache_dir().join("gatsby-source-git").join(name)
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A command running in the fixture directory, isolated from the
    /// caller's configuration and cache.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("git-source");
        cmd.current_dir(self.path())
            .env("GIT_SOURCE_CACHE", self.cache_dir())
            .env_remove("GIT_SOURCE_CONFIG")
            .env_remove("RUST_LOG")
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
