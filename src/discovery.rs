//! # File Discovery
//!
//! Expands resolved [`PatternEntry`] globs against a working copy and tags
//! every match with its group name.
//!
//! Globs are evaluated relative to the working-copy root, like `cwd`-relative
//! globbing in a shell. Wildcards never match a leading `.` (so `**` skips
//! dotfiles unless the pattern names them literally), only regular files are
//! returned, and anything inside the `.git` metadata directory is never
//! reported.
//!
//! Groups are independent: a file matched by two groups is reported twice,
//! once per group. Groups are expanded in parallel; the result keeps group
//! order, while the order of files inside a group is whatever the directory
//! walk produced.

use std::path::{Path, PathBuf};

use glob::MatchOptions;
use log::debug;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::path::{is_git_metadata, relative_slash_path};
use crate::patterns::PatternEntry;

/// A file matched by one pattern group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscoveredFile {
    pub absolute_path: PathBuf,
    pub group: String,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Expands every entry against `root`, concatenating groups in entry order.
pub fn discover(root: &Path, entries: &[PatternEntry]) -> Result<Vec<DiscoveredFile>> {
    let root = std::path::absolute(root)?;

    let groups = entries
        .par_iter()
        .map(|entry| expand(&root, entry))
        .collect::<Result<Vec<_>>>()?;

    Ok(groups.into_iter().flatten().collect())
}

/// Expands a single entry against an absolute `root`.
pub fn expand(root: &Path, entry: &PatternEntry) -> Result<Vec<DiscoveredFile>> {
    let pattern = rooted_pattern(root, &entry.pattern);
    debug!("expanding group '{}': {}", entry.name, pattern);

    let paths = glob::glob_with(&pattern, MATCH_OPTIONS).map_err(|source| Error::Pattern {
        group: entry.name.clone(),
        source,
    })?;

    let mut files = Vec::new();
    for path in paths {
        let path = path?;
        if !path.is_file() || is_git_metadata(&relative_slash_path(root, &path)) {
            continue;
        }
        files.push(DiscoveredFile {
            absolute_path: path,
            group: entry.name.clone(),
        });
    }

    debug!("group '{}' matched {} file(s)", entry.name, files.len());
    Ok(files)
}

/// Joins a user glob onto the escaped root.
///
/// A trailing `**` only matches directories in `glob`, so it is widened to
/// `**/*` to pick up the files below them.
fn rooted_pattern(root: &Path, pattern: &str) -> String {
    let mut relative = pattern.trim();
    while let Some(rest) = relative.strip_prefix("./") {
        relative = rest;
    }
    let relative = relative.trim_start_matches('/');

    let mut rooted = glob::Pattern::escape(&root.to_string_lossy());
    if !rooted.ends_with('/') {
        rooted.push('/');
    }
    rooted.push_str(relative);
    if relative == "**" || relative.ends_with("/**") {
        rooted.push_str("/*");
    }
    rooted
}
