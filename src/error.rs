//! # Error Handling
//!
//! This module defines the centralized error type for `git-source`. It uses
//! `thiserror` to build a single `Error` enum that covers every failure the
//! synchronization and ingestion pipeline can hit, each variant carrying the
//! context needed to act on it (the remote URL, the offending path, the git
//! command and its stderr).
//!
//! ## Error kinds
//!
//! Every variant maps onto one [`ErrorKind`] through [`Error::kind`]:
//!
//! - **Configuration**: an unparseable pattern spec or a missing/invalid
//!   source field. Raised before any I/O happens.
//! - **SyncConflict**: an existing working copy whose `origin` is not the
//!   configured remote.
//! - **Transport**: clone or fetch failures (network, authentication, a
//!   branch the remote does not have) and any other failing git command.
//! - **Discovery**: glob expansion failures.
//! - **Emission**: a record rejected by validation or by the node sink.
//! - **Io**: plain filesystem errors.
//!
//! The `Result` alias is used throughout the library.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for git-source operations
#[derive(Error, Debug)]
pub enum Error {
    /// The source configuration could not be parsed or failed validation.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A non-empty working copy exists whose origin differs from the
    /// configured remote.
    #[error("Can't clone to target destination: {}: origin is {}, expected {expected}", path.display(), found.as_deref().unwrap_or("<unreadable>"))]
    SyncConflict {
        path: PathBuf,
        expected: String,
        /// The origin URL read from the working copy, if any could be read.
        found: Option<String>,
    },

    /// A shallow clone failed.
    #[error("Git clone error for {url}@{branch}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitClone {
        url: String,
        /// The requested branch, or `HEAD` when following the default branch.
        branch: String,
        message: String,
        hint: Option<String>,
    },

    /// A git command other than clone exited unsuccessfully.
    #[error("Git command failed in {}: {command} - {stderr}", path.display())]
    GitCommand {
        command: String,
        path: PathBuf,
        stderr: String,
    },

    /// The `git` binary could not be started at all.
    #[error("Failed to execute git {command}: {message}")]
    GitSpawn { command: String, message: String },

    /// A remote URL did not match any supported git URL form.
    #[error("Invalid git remote '{url}': {message}")]
    InvalidRemote { url: String, message: String },

    /// A glob pattern could not be compiled.
    #[error("Glob pattern error in group '{group}': {source}")]
    Pattern {
        group: String,
        #[source]
        source: glob::PatternError,
    },

    /// A filesystem entry could not be read while expanding a glob.
    #[error("Glob expansion error: {0}")]
    GlobWalk(#[from] glob::GlobError),

    /// A record failed validation before being handed to the sink.
    #[error("Invalid record {id}: {message}")]
    InvalidRecord { id: String, message: String },

    /// The node sink refused a record.
    #[error("Node emission error: {message}")]
    Emit { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// The failure classes a pipeline run can halt with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    SyncConflict,
    Transport,
    Discovery,
    Emission,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Configuration => "configuration error",
            ErrorKind::SyncConflict => "sync conflict",
            ErrorKind::Transport => "transport error",
            ErrorKind::Discovery => "discovery error",
            ErrorKind::Emission => "emission error",
            ErrorKind::Io => "I/O error",
        };
        f.write_str(label)
    }
}

impl Error {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConfigParse { .. } | Error::Yaml(_) | Error::InvalidRemote { .. } => {
                ErrorKind::Configuration
            }
            Error::UrlParse(_) => ErrorKind::Configuration,
            Error::SyncConflict { .. } => ErrorKind::SyncConflict,
            Error::GitClone { .. } | Error::GitCommand { .. } | Error::GitSpawn { .. } => {
                ErrorKind::Transport
            }
            Error::Pattern { .. } | Error::GlobWalk(_) => ErrorKind::Discovery,
            Error::InvalidRecord { .. } | Error::Emit { .. } | Error::Json(_) => {
                ErrorKind::Emission
            }
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Shorthand for a `ConfigParse` error without a hint.
    pub fn config(message: impl Into<String>) -> Self {
        Error::ConfigParse {
            message: message.into(),
            hint: None,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
