//! # Source Configuration
//!
//! This module defines the data structures that represent the
//! `.git-source.yaml` configuration file, as well as the logic for parsing
//! and validating it.
//!
//! The file is a YAML sequence of sources:
//!
//! ```yaml
//! - name: blog
//!   remote: https://github.com/org/blog.git
//!   branch: main            # optional, defaults to the remote's default branch
//!   patterns:               # optional, defaults to "**"
//!     posts: "content/posts/**/*.md"
//!     pages: "content/pages/**/*.html"
//! ```
//!
//! Every check in this module runs before any git or filesystem work, so a
//! malformed configuration fails fast with a `ConfigParse` error.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::is_safe_segment;
use crate::patterns::{self, PatternEntry, PatternSpec};
use crate::remote::GitUrl;
use crate::repository::BranchSpec;

/// One git remote to mirror and scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Unique name of the source. Also the working-copy directory name and
    /// the default pattern group.
    pub name: String,
    /// The git URL to mirror.
    pub remote: String,
    /// Branch to track. The remote's default branch is followed if omitted.
    #[serde(default)]
    pub branch: Option<String>,
    /// Which files to emit records for.
    #[serde(default)]
    pub patterns: PatternSpec,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, remote: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote: remote.into(),
            branch: None,
            patterns: PatternSpec::default(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_patterns(mut self, patterns: PatternSpec) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn branch_spec(&self) -> BranchSpec {
        match &self.branch {
            Some(branch) => BranchSpec::Named(branch.clone()),
            None => BranchSpec::Default,
        }
    }

    /// Pattern entries with this source's name as the default group.
    pub fn pattern_entries(&self) -> Vec<PatternEntry> {
        patterns::resolve(&self.patterns, &self.name)
    }

    /// Checks the fields that must hold before any I/O.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config("source 'name' must not be empty"));
        }
        if !is_safe_segment(&self.name) {
            return Err(Error::ConfigParse {
                message: format!("source name '{}' is not a valid directory name", self.name),
                hint: Some("Use letters, digits, '-' or '_' without path separators".to_string()),
            });
        }
        if self.remote.trim().is_empty() {
            return Err(Error::config(format!(
                "source '{}' must set a non-empty 'remote'",
                self.name
            )));
        }
        GitUrl::parse(&self.remote)?;
        if let Some(branch) = &self.branch {
            if branch.trim().is_empty() {
                return Err(Error::ConfigParse {
                    message: format!("source '{}' has an empty 'branch'", self.name),
                    hint: Some("Remove 'branch' to follow the remote's default branch".to_string()),
                });
            }
        }
        Ok(())
    }
}

/// Parses and validates a YAML configuration document.
pub fn parse(yaml_content: &str) -> Result<Vec<SourceConfig>> {
    let sources: Vec<SourceConfig> = serde_yaml::from_str(yaml_content).map_err(|e| {
        Error::ConfigParse {
            message: e.to_string(),
            hint: Some("Each source needs at least 'name' and 'remote'".to_string()),
        }
    })?;

    let mut seen = HashSet::new();
    for source in &sources {
        source.validate()?;
        if !seen.insert(source.name.as_str()) {
            return Err(Error::ConfigParse {
                message: format!("duplicate source name '{}'", source.name),
                hint: Some("Each source needs its own name; it selects the working copy".to_string()),
            });
        }
    }

    Ok(sources)
}

/// Parse a configuration from a YAML file path
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Vec<SourceConfig>> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}
