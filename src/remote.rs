//! # Remote Metadata
//!
//! Parses git remote URLs into their components and derives the metadata
//! that tags a synchronized working copy: a canonical web link and the
//! currently checked-out ref.
//!
//! Supported URL forms:
//!
//! - `https://host/owner/repo.git`, `http://…`
//! - `ssh://user@host:port/owner/repo.git`, `git+ssh://…`
//! - `git://host/owner/repo`
//! - `file:///srv/git/repo.git`, bare absolute paths, and paths relative to
//!   the current directory starting with `./` or `../`
//! - scp-like `user@host:owner/repo.git`
//!
//! The `.git` suffix and a trailing `/` are optional everywhere. Every path
//! segment except the last forms the owner, so nested groups such as
//! `gitlab.com/group/subgroup/repo` are kept intact.

use std::fmt;
use std::path::{Component, Path};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::error::{Error, Result};
use crate::repository::GitOperations;

/// Structured components of a git remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitUrl {
    /// `https`, `http`, `ssh`, `git` or `file`.
    pub protocol: String,
    /// Host name; empty for `file` remotes.
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub pathname: String,
    pub source: String,
}

impl GitUrl {
    pub fn parse(remote: &str) -> Result<Self> {
        let remote = remote.trim();
        if remote.is_empty() {
            return Err(invalid(remote, "remote URL is empty"));
        }

        if remote.contains("://") {
            return Self::from_url(remote);
        }
        if remote.starts_with('/') {
            return Self::build(remote, "file", String::new(), None, None, remote.to_string());
        }
        if remote.starts_with("./") || remote.starts_with("../") {
            let pathname = absolute_local_path(remote)?;
            return Self::build(remote, "file", String::new(), None, None, pathname);
        }
        if let Some(captures) = scp_like().captures(remote) {
            let user = captures.get(1).map(|m| m.as_str().to_string());
            let host = captures[2].to_string();
            let path = format!("/{}", captures[3].trim_start_matches('/'));
            return Self::build(remote, "ssh", host, None, user, path);
        }

        Err(invalid(remote, "not a recognized git URL"))
    }

    fn from_url(remote: &str) -> Result<Self> {
        let url = Url::parse(remote).map_err(|e| invalid(remote, &e.to_string()))?;
        let protocol = match url.scheme() {
            "git+ssh" | "ssh+git" => "ssh",
            "http" | "https" | "ssh" | "git" | "file" => url.scheme(),
            other => return Err(invalid(remote, &format!("unsupported scheme '{}'", other))),
        };
        let host = url.host_str().unwrap_or_default().to_string();
        if host.is_empty() && protocol != "file" {
            return Err(invalid(remote, "missing host"));
        }
        let user = Some(url.username())
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        Self::build(
            remote,
            protocol,
            host,
            url.port(),
            user,
            url.path().to_string(),
        )
    }

    fn build(
        remote: &str,
        protocol: &str,
        resource: String,
        port: Option<u16>,
        user: Option<String>,
        pathname: String,
    ) -> Result<Self> {
        let segments: Vec<&str> = pathname.split('/').filter(|s| !s.is_empty()).collect();
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| invalid(remote, "no repository path"))?;

        let name = last.strip_suffix(".git").unwrap_or(last).to_string();
        if name.is_empty() {
            return Err(invalid(remote, "empty repository name"));
        }
        let owner = parents.join("/");
        let full_name = if owner.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", owner, name)
        };

        Ok(Self {
            protocol: protocol.to_string(),
            source: resource.clone(),
            resource,
            port,
            user,
            owner,
            name,
            full_name,
            pathname,
        })
    }

    /// Canonical browser URL for the repository.
    ///
    /// Always `https`, whatever transport the remote uses. The port survives
    /// only when the original URL was http(s) with an explicit port; an SSH
    /// port says nothing about the web server. `file` remotes have no web
    /// form and link to the repository directory instead.
    pub fn web_link(&self) -> String {
        if self.protocol == "file" {
            return format!("file://{}", self.pathname.trim_end_matches('/'));
        }
        match self.port {
            Some(port) if self.protocol == "http" || self.protocol == "https" => {
                format!("https://{}:{}/{}", self.resource, port, self.full_name)
            }
            _ => format!("https://{}/{}", self.resource, self.full_name),
        }
    }
}

impl fmt::Display for GitUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.resource.is_empty() {
            write!(f, "{}", self.full_name)
        } else {
            write!(f, "{}/{}", self.resource, self.full_name)
        }
    }
}

/// Everything the remote descriptor is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMetadata {
    pub url: GitUrl,
    pub web_link: String,
    /// Short name of the checked-out ref in the working copy.
    pub git_ref: String,
}

/// Reads metadata for a synchronized working copy. Never mutates it.
pub fn describe(git: &dyn GitOperations, working_copy: &Path, remote: &str) -> Result<RemoteMetadata> {
    let url = GitUrl::parse(remote)?;
    let git_ref = git.current_ref(working_copy)?.trim().to_string();
    Ok(RemoteMetadata {
        web_link: url.web_link(),
        url,
        git_ref,
    })
}

/// Resolves a relative repository path against the current directory,
/// dropping `.` and `..` segments without touching the filesystem.
fn absolute_local_path(remote: &str) -> Result<String> {
    let absolute = std::path::absolute(remote).map_err(|e| invalid(remote, &e.to_string()))?;
    let mut segments: Vec<String> = Vec::new();
    for component in absolute.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
            Component::ParentDir => {
                segments.pop();
            }
            _ => {}
        }
    }
    Ok(format!("/{}", segments.join("/")))
}

fn scp_like() -> &'static Regex {
    static SCP_LIKE: OnceLock<Regex> = OnceLock::new();
    SCP_LIKE.get_or_init(|| Regex::new(r"^(?:([^@/:]+)@)?([^@/:]+):(.+)$").expect("static regex"))
}

fn invalid(url: &str, message: &str) -> Error {
    Error::InvalidRemote {
        url: url.to_string(),
        message: message.to_string(),
    }
}
