//! Thin wrappers around the system `git` binary.
//!
//! Every function here shells out once and either returns trimmed stdout or
//! an error carrying git's own message. Using the system binary means SSH
//! keys, credential helpers and `~/.gitconfig` rewrites all apply exactly as
//! they do for the user on the command line.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::error::{Error, Result};

/// Shallow-clone `url` into `target_dir` with a history depth of one.
///
/// `branch` restricts the clone to that branch; `None` clones whatever the
/// remote advertises as its default. The target must be absent or empty.
pub fn clone_shallow(url: &str, branch: Option<&str>, target_dir: &Path) -> Result<()> {
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut cmd = Command::new("git");
    cmd.args(["clone", "--depth", "1"]);
    if let Some(branch) = branch {
        cmd.args(["--branch", branch]);
    }
    cmd.arg("--").arg(url).arg(target_dir);

    debug!("git clone --depth 1 {} -> {}", url, target_dir.display());
    let output = cmd.output().map_err(|e| Error::GitClone {
        url: url.to_string(),
        branch: branch.unwrap_or("HEAD").to_string(),
        message: e.to_string(),
        hint: Some("Make sure git is installed and on PATH".to_string()),
    })?;

    if !output.status.success() {
        let message = format_git_error(&output);
        let hint = clone_hint(&message, branch);
        return Err(Error::GitClone {
            url: url.to_string(),
            branch: branch.unwrap_or("HEAD").to_string(),
            message,
            hint,
        });
    }

    Ok(())
}

/// Fetch the newest commit from `origin` at depth one.
///
/// For a named branch the remote-tracking ref is updated explicitly so the
/// fetch also works when the clone was restricted to a different branch.
pub fn fetch_shallow(repo: &Path, branch: Option<&str>) -> Result<()> {
    match branch {
        Some(branch) => {
            let refspec = format!("+refs/heads/{0}:refs/remotes/origin/{0}", branch);
            run_git(repo, &["fetch", "--depth", "1", "origin", &refspec])?;
        }
        None => {
            run_git(repo, &["fetch", "--depth", "1", "origin"])?;
        }
    }
    Ok(())
}

/// Force the working tree and index to `target`, discarding local changes.
pub fn reset_hard(repo: &Path, target: &str) -> Result<()> {
    run_git(repo, &["reset", "--hard", target])?;
    Ok(())
}

/// The URL of the repository's default remote.
pub fn remote_url(repo: &Path) -> Result<String> {
    run_git(repo, &["ls-remote", "--get-url"])
}

/// The remote's default branch as a remote-tracking ref, e.g. `origin/main`.
pub fn default_branch(repo: &Path) -> Result<String> {
    run_git(
        repo,
        &["symbolic-ref", "--short", "refs/remotes/origin/HEAD"],
    )
}

/// Short name of the checked-out ref, e.g. `main`.
pub fn current_ref(repo: &Path) -> Result<String> {
    run_git(repo, &["rev-parse", "--abbrev-ref", "HEAD"])
}

/// Runs `git <args>` inside `repo` and returns trimmed stdout.
pub fn run_git(repo: &Path, args: &[&str]) -> Result<String> {
    let command = args.join(" ");
    debug!("git {} (in {})", command, repo.display());

    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .map_err(|e| Error::GitSpawn {
            command: command.clone(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::GitCommand {
            command,
            path: repo.to_path_buf(),
            stderr: format_git_error(&output),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Formats a git failure from stderr, falling back to stdout and the exit
/// code when stderr is empty.
pub fn format_git_error(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

    match (stderr.is_empty(), stdout.is_empty()) {
        (true, true) => format!(
            "Command failed with exit code {}",
            output.status.code().unwrap_or(-1)
        ),
        (true, false) => stdout,
        (false, true) => stderr,
        (false, false) => format!("{}\n{}", stderr, stdout),
    }
}

/// Picks a remediation hint for a failed clone, if one applies.
pub fn clone_hint(message: &str, branch: Option<&str>) -> Option<String> {
    static MISSING_BRANCH: OnceLock<Regex> = OnceLock::new();
    let missing_branch = MISSING_BRANCH
        .get_or_init(|| Regex::new(r"[Rr]emote branch (\S+) not found").expect("static regex"));

    if let Some(captures) = missing_branch.captures(message) {
        return Some(format!(
            "The remote has no branch named '{}'. Fix 'branch' or remove it to follow the default branch",
            &captures[1]
        ));
    }

    let lower = message.to_lowercase();
    if lower.contains("authentication failed")
        || lower.contains("permission denied")
        || lower.contains("could not read from remote repository")
    {
        return Some(
            "Make sure you have access to the repository: an SSH key loaded in ssh-agent, \
             configured git credentials, or a personal access token"
                .to_string(),
        );
    }

    if lower.contains("could not resolve host") || lower.contains("unable to access") {
        return Some("Check the remote URL and your network connection".to_string());
    }

    if branch.is_none() && lower.contains("not found") {
        return Some("Check that the remote URL points at an existing repository".to_string());
    }

    None
}
