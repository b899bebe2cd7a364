//! # Pattern Resolution
//!
//! Users describe which files to pick up from a working copy with a pattern
//! specification that comes in three shapes:
//!
//! ```yaml
//! patterns: "**/*.md"                 # a single glob
//! patterns: ["**/*.md", "**/*.mdx"]   # a list (items may be any shape)
//! patterns:                           # named groups
//!   posts: "content/posts/**/*.md"
//!   pages: "content/pages/**/*.html"
//! ```
//!
//! The shape is decided exactly once, when the YAML value is converted into a
//! [`PatternSpec`]. Anything else (numbers, booleans, null, a mapping whose
//! values are not strings, empty globs) is rejected as a configuration error
//! instead of being silently dropped. [`resolve`] then flattens a spec into an
//! ordered list of [`PatternEntry`] values, which is the only representation
//! the rest of the crate sees.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{Error, Result};

/// The pattern applied when a source does not configure any.
pub const DEFAULT_PATTERN: &str = "**";

/// A glob pattern with the logical group name its matches are tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PatternEntry {
    pub name: String,
    pub pattern: String,
}

impl PatternEntry {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
        }
    }
}

/// A user-supplied pattern specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum PatternSpec {
    /// One glob, grouped under the source's default name.
    Single(String),
    /// A sequence of specs, resolved in order and concatenated.
    List(Vec<PatternSpec>),
    /// `name -> glob` pairs in declaration order.
    Named(Vec<(String, String)>),
}

impl Default for PatternSpec {
    fn default() -> Self {
        PatternSpec::Single(DEFAULT_PATTERN.to_string())
    }
}

impl PatternSpec {
    /// Converts a raw YAML value into a spec, failing on unsupported shapes.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(pattern) => Ok(PatternSpec::Single(non_empty_pattern(pattern)?)),
            Value::Sequence(items) => items
                .iter()
                .map(PatternSpec::from_value)
                .collect::<Result<Vec<_>>>()
                .map(PatternSpec::List),
            Value::Mapping(map) => {
                let mut groups = Vec::with_capacity(map.len());
                for (key, pattern) in map {
                    let name = key.as_str().ok_or_else(|| Error::ConfigParse {
                        message: format!("pattern group names must be strings, got {:?}", key),
                        hint: None,
                    })?;
                    let pattern = pattern.as_str().ok_or_else(|| Error::ConfigParse {
                        message: format!("pattern for group '{}' must be a string", name),
                        hint: Some(format!("{}: \"**/*.md\"", name)),
                    })?;
                    groups.push((name.to_string(), non_empty_pattern(pattern)?));
                }
                Ok(PatternSpec::Named(groups))
            }
            Value::Tagged(tagged) => PatternSpec::from_value(&tagged.value),
            other => Err(Error::ConfigParse {
                message: format!(
                    "patterns must be a string, a list or a mapping, got {}",
                    describe_value(other)
                ),
                hint: Some("Use patterns: \"**/*.md\" or a mapping of group names to globs".to_string()),
            }),
        }
    }
}

impl TryFrom<Value> for PatternSpec {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        PatternSpec::from_value(&value)
    }
}

impl From<PatternSpec> for Value {
    fn from(spec: PatternSpec) -> Self {
        match spec {
            PatternSpec::Single(pattern) => Value::String(pattern),
            PatternSpec::List(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            PatternSpec::Named(groups) => Value::Mapping(
                groups
                    .into_iter()
                    .map(|(name, pattern)| (Value::String(name), Value::String(pattern)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for PatternSpec {
    fn from(pattern: &str) -> Self {
        PatternSpec::Single(pattern.to_string())
    }
}

/// Flattens a spec into ordered `(name, pattern)` entries.
///
/// Single patterns take `default_name`; list items are resolved recursively
/// with the same default and concatenated in order.
pub fn resolve(spec: &PatternSpec, default_name: &str) -> Vec<PatternEntry> {
    match spec {
        PatternSpec::Single(pattern) => vec![PatternEntry::new(default_name, pattern.as_str())],
        PatternSpec::List(items) => items
            .iter()
            .flat_map(|item| resolve(item, default_name))
            .collect(),
        PatternSpec::Named(groups) => groups
            .iter()
            .map(|(name, pattern)| PatternEntry::new(name.as_str(), pattern.as_str()))
            .collect(),
    }
}

fn non_empty_pattern(pattern: &str) -> Result<String> {
    if pattern.trim().is_empty() {
        return Err(Error::config("glob patterns must not be empty"));
    }
    Ok(pattern.to_string())
}

fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
