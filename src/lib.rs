//! # git-source
//!
//! Mirrors git remotes into shallow local working copies and turns the files
//! matched by configurable glob patterns into content-addressed records,
//! each linked back to a record describing its remote. The crate is used by
//! the `git-source` command-line tool and can be embedded in any indexing
//! pipeline that wants the same records.
//!
//! ## Quick Example
//!
//! ```
//! use git_source::config;
//! use git_source::patterns::PatternEntry;
//!
//! let sources = config::parse(r#"
//! - name: blog
//!   remote: https://github.com/org/blog.git
//!   patterns:
//!     posts: "content/posts/**/*.md"
//!     pages: "content/pages/**/*.html"
//! "#).unwrap();
//!
//! assert_eq!(sources[0].pattern_entries(), vec![
//!     PatternEntry::new("posts", "content/posts/**/*.md"),
//!     PatternEntry::new("pages", "content/pages/**/*.html"),
//! ]);
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`, `patterns`)**: the `.git-source.yaml` schema.
//!   Pattern specs (a string, a list or a mapping) are normalized once into
//!   ordered `(group, glob)` entries.
//! - **Repository synchronization (`repository`, `git`)**: the clone / reuse /
//!   conflict state machine behind a mockable `GitOperations` trait.
//! - **Remote metadata (`remote`)**: git URL parsing and canonical web links.
//! - **Discovery (`discovery`)**: glob expansion over a working copy.
//! - **Records (`records`, `sink`)**: record types, ids, digests, and the
//!   sinks and reporters they flow into.
//! - **Pipeline (`pipeline`)**: orchestrates one all-or-nothing run per
//!   source.

pub mod config;
pub mod defaults;
pub mod discovery;
pub mod error;
pub mod git;
pub mod output;
pub mod path;
pub mod patterns;
pub mod pipeline;
pub mod records;
pub mod remote;
pub mod repository;
pub mod sink;
pub mod suggestions;

#[cfg(test)]
mod patterns_proptest;
