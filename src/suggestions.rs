//! # Error Suggestions
//!
//! Helpers that build command-layer errors with hints. Errors should say
//! what went wrong and how to fix it.
//!
//! ```rust,ignore
//! use git_source::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Configuration file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::config_not_found(path));
//! ```

use std::path::Path;

/// The configuration file does not exist.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create a .git-source.yaml file listing your sources\n\
         hint: Use -c/--config to specify a different path\n\
         hint: Set GIT_SOURCE_CONFIG environment variable",
        path = path.display()
    )
}

/// `cache clean` was called without saying what to remove.
pub fn cache_clean_no_filter() -> anyhow::Error {
    anyhow::anyhow!(
        "At least one filter must be specified for cache clean\n\n\
         hint: Use --name <NAME> to remove one working copy\n\
         hint: Use --all to remove every working copy"
    )
}

/// `--source` named something the configuration does not define.
pub fn unknown_source(name: &str, configured: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(name, configured)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();
    let known = if configured.is_empty() {
        "(none)".to_string()
    } else {
        configured.join(", ")
    };

    anyhow::anyhow!(
        "Unknown source: {name}{did_you_mean}\n\n\
         Configured sources are: {known}"
    )
}

/// Remediation lines printed after a sync conflict for `name`.
pub fn sync_conflict_hint(name: &str, working_copy: &Path) -> String {
    format!(
        "hint: The working copy at {path} belongs to a different remote\n\
         hint: Run 'git-source cache clean --name {name}' and sync again",
        path = working_copy.display()
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut previous: Vec<usize> = (0..=b_len).collect();
    let mut current = vec![0usize; b_len + 1];

    for i in 1..=a_len {
        current[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_len]
}
