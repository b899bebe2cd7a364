//! Default values for git-source configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Default location of the source configuration file.
pub const DEFAULT_CONFIG_FILE: &str = ".git-source.yaml";

/// Returns the default cache directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/git-source` (XDG Base Directory)
/// - macOS: `~/Library/Caches/git-source`
/// - Windows: `{FOLDERID_LocalAppData}\git-source`
///
/// Falls back to `.cache` in the current directory if the platform cache
/// directory cannot be determined.
///
/// This can be overridden by the `--cache-dir` CLI flag or the
/// `GIT_SOURCE_CACHE` environment variable.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("git-source"))
        .unwrap_or_else(|| PathBuf::from(".cache"))
}
