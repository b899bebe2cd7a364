//! # CLI Command Implementations
//!
//! Each subcommand of `git-source` lives in its own file with:
//! - an `Args` struct deriving `clap::Args` for its options, and
//! - an `execute` function that runs it on top of the `git_source` library.
//!
//! Options shared by the commands that read the configuration live in
//! [`SourceArgs`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use git_source::config::{self, SourceConfig};
use git_source::defaults::{default_cache_dir, DEFAULT_CONFIG_FILE};
use git_source::suggestions;

pub mod cache;
pub mod completions;
pub mod ls;
pub mod sync;

/// Configuration and cache location options.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Path to the source configuration file.
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "GIT_SOURCE_CONFIG",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Directory holding the working copies.
    ///
    /// Defaults to the system cache directory (`~/.cache/git-source` on
    /// Linux, `~/Library/Caches/git-source` on macOS).
    #[arg(long, value_name = "DIR", env = "GIT_SOURCE_CACHE")]
    pub cache_dir: Option<PathBuf>,

    /// Only handle the named source. Can be repeated.
    #[arg(short, long = "source", value_name = "NAME")]
    pub sources: Vec<String>,
}

impl SourceArgs {
    pub fn cache_dir(&self) -> PathBuf {
        resolve_cache_dir(self.cache_dir.clone())
    }

    /// Loads the configuration and applies the `--source` filter.
    pub fn load(&self) -> Result<Vec<SourceConfig>> {
        let sources = load_sources(&self.config)?;
        select_sources(sources, &self.sources)
    }
}

pub fn resolve_cache_dir(cache_dir: Option<PathBuf>) -> PathBuf {
    cache_dir.unwrap_or_else(default_cache_dir)
}

fn load_sources(path: &Path) -> Result<Vec<SourceConfig>> {
    if !path.exists() {
        return Err(suggestions::config_not_found(path));
    }
    config::from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Keeps the sources named in `wanted`, in configuration order. An empty
/// filter keeps everything.
fn select_sources(sources: Vec<SourceConfig>, wanted: &[String]) -> Result<Vec<SourceConfig>> {
    if wanted.is_empty() {
        return Ok(sources);
    }

    let configured: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
    if let Some(unknown) = wanted.iter().find(|w| !configured.contains(&w.as_str())) {
        return Err(suggestions::unknown_source(unknown, &configured));
    }

    Ok(sources
        .into_iter()
        .filter(|s| wanted.contains(&s.name))
        .collect())
}
