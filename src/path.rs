//! Path helpers for working copies and discovered files

use std::path::{Component, Path, PathBuf};

/// Fixed namespace segment under the cache directory that holds every
/// working copy.
pub const NAMESPACE: &str = "gatsby-source-git";

/// The directory holding every working copy under `cache_dir`.
pub fn namespace_dir(cache_dir: &Path) -> PathBuf {
    cache_dir.join(NAMESPACE)
}

/// Deterministic working-copy location for a source name.
///
/// Re-runs with the same `name` always land on the same directory, which is
/// what lets the synchronizer reuse an existing clone.
pub fn working_copy_path(cache_dir: &Path, name: &str) -> PathBuf {
    namespace_dir(cache_dir).join(name)
}

/// Returns true if `name` can be used as exactly one path component.
pub fn is_safe_segment(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// `path` relative to `root`, with `/` separators.
///
/// Paths outside `root` are returned unchanged.
pub fn relative_slash_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns true if any component of `relative` is the `.git` directory.
pub fn is_git_metadata(relative: &str) -> bool {
    relative.split('/').any(|component| component == ".git")
}
