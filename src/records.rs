//! # Records
//!
//! The records a run emits: one [`RemoteDescriptor`] per source and one
//! [`FileRecord`] per discovered file. File records point back at their
//! descriptor through an explicit `gitRemote___NODE` foreign key, which is
//! validated before anything is handed to a sink.
//!
//! Identifiers are UUIDv5 values in a namespace derived from the working-copy
//! namespace literal, so the same seed always yields the same id across runs
//! and machines.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::path::{relative_slash_path, NAMESPACE};
use crate::remote::RemoteMetadata;

/// `internal.type` of remote descriptors.
pub const REMOTE_TYPE: &str = "GitRemote";
/// `internal.type` of file records.
pub const FILE_TYPE: &str = "File";

/// Stable, content-independent record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Derives the id for `seed`.
    pub fn create(seed: &str) -> Self {
        let namespace = Uuid::new_v5(&Uuid::NAMESPACE_OID, NAMESPACE.as_bytes());
        NodeId(Uuid::new_v5(&namespace, seed.as_bytes()).to_string())
    }

    /// Id of the remote descriptor for the source called `name`.
    pub fn for_remote(name: &str) -> Self {
        Self::create(&format!("git-remote-{}", name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SHA-256 hex digest of `bytes`.
pub fn content_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Bookkeeping block every record carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Internal {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub content_digest: String,
}

/// Descriptive fields of a remote descriptor, also its digested content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFields {
    pub source_instance_name: String,
    pub web_link: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub protocol: String,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub pathname: String,
    pub source: String,
}

/// The record representing one synchronized remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDescriptor {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub internal: Internal,
    #[serde(flatten)]
    pub fields: RemoteFields,
}

impl RemoteDescriptor {
    pub fn new(name: &str, metadata: &RemoteMetadata) -> Result<Self> {
        let url = &metadata.url;
        let fields = RemoteFields {
            source_instance_name: name.to_string(),
            web_link: metadata.web_link.clone(),
            git_ref: metadata.git_ref.clone(),
            protocol: url.protocol.clone(),
            resource: url.resource.clone(),
            port: url.port,
            user: url.user.clone(),
            owner: url.owner.clone(),
            name: url.name.clone(),
            full_name: url.full_name.clone(),
            pathname: url.pathname.clone(),
            source: url.source.clone(),
        };
        let content = serde_json::to_string(&fields)?;

        Ok(Self {
            id: NodeId::for_remote(name),
            parent: None,
            children: Vec::new(),
            internal: Internal {
                node_type: REMOTE_TYPE.to_string(),
                media_type: None,
                content_digest: content_digest(content.as_bytes()),
                content: Some(content),
            },
            fields,
        })
    }
}

/// Base file record, before it is linked to a remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub internal: Internal,
    /// The pattern group that matched this file.
    pub source_instance_name: String,
    pub absolute_path: String,
    pub relative_path: String,
    pub relative_directory: String,
    pub root: String,
    pub base: String,
    pub name: String,
    /// Extension with its leading dot, or empty.
    pub ext: String,
    /// Extension without the dot, or empty.
    pub extension: String,
    pub size: u64,
    pub modified_time: String,
}

/// A file node linked to the remote it was discovered in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(flatten)]
    pub file: FileNode,
    #[serde(rename = "gitRemote___NODE")]
    pub git_remote: NodeId,
}

impl FileRecord {
    pub fn new(file: FileNode, remote: &NodeId) -> Self {
        Self {
            file,
            git_remote: remote.clone(),
        }
    }
}

/// Anything a sink accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Remote(RemoteDescriptor),
    File(FileRecord),
}

impl Node {
    pub fn id(&self) -> &NodeId {
        match self {
            Node::Remote(remote) => &remote.id,
            Node::File(record) => &record.file.id,
        }
    }

    pub fn internal(&self) -> &Internal {
        match self {
            Node::Remote(remote) => &remote.internal,
            Node::File(record) => &record.file.internal,
        }
    }

    /// Checks the fields every sink relies on. File records must also point
    /// at `remote`.
    pub fn validate(&self, remote: &NodeId) -> Result<()> {
        let fail = |message: String| Error::InvalidRecord {
            id: self.id().to_string(),
            message,
        };

        if self.id().as_str().is_empty() {
            return Err(fail("empty id".to_string()));
        }
        let internal = self.internal();
        if internal.node_type.is_empty() {
            return Err(fail("empty internal.type".to_string()));
        }
        if internal.content_digest.is_empty() {
            return Err(fail("empty internal.contentDigest".to_string()));
        }
        if let Node::File(record) = self {
            if &record.git_remote != remote {
                return Err(fail(format!(
                    "gitRemote___NODE is {}, expected {}",
                    record.git_remote, remote
                )));
            }
        }
        Ok(())
    }
}

/// Turns a path into a base file record.
pub trait FileNodeFactory: Send + Sync {
    /// `path` lies inside `root`; `group` becomes `sourceInstanceName`.
    fn create_file_node(&self, path: &Path, root: &Path, group: &str) -> Result<FileNode>;
}

/// Builds file records from filesystem metadata and a SHA-256 of the bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatFileNodeFactory;

impl FileNodeFactory for StatFileNodeFactory {
    fn create_file_node(&self, path: &Path, root: &Path, group: &str) -> Result<FileNode> {
        let metadata = std::fs::metadata(path)?;

        let mut hasher = Sha256::new();
        io::copy(&mut File::open(path)?, &mut hasher)?;
        let digest = format!("{:x}", hasher.finalize());

        let relative_path = relative_slash_path(root, path);
        let relative_directory = match relative_path.rsplit_once('/') {
            Some((dir, _)) => dir.to_string(),
            None => String::new(),
        };
        let base = file_name(path);
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| base.clone());
        let modified: DateTime<Utc> = metadata.modified()?.into();
        let absolute_path = path.to_string_lossy().into_owned();

        Ok(FileNode {
            id: NodeId::create(&absolute_path),
            parent: None,
            children: Vec::new(),
            internal: Internal {
                node_type: FILE_TYPE.to_string(),
                media_type: media_type(&extension).map(str::to_string),
                content: None,
                content_digest: digest,
            },
            source_instance_name: group.to_string(),
            absolute_path,
            relative_path,
            relative_directory,
            root: root.to_string_lossy().into_owned(),
            base,
            name,
            ext: if extension.is_empty() {
                String::new()
            } else {
                format!(".{}", extension)
            },
            extension,
            size: metadata.len(),
            modified_time: modified.to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn media_type(extension: &str) -> Option<&'static str> {
    let media_type = match extension.to_ascii_lowercase().as_str() {
        "md" | "markdown" => "text/markdown",
        "mdx" => "text/mdx",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "js" | "mjs" | "cjs" => "application/javascript",
        "ts" => "application/typescript",
        "json" => "application/json",
        "yaml" | "yml" => "text/yaml",
        "toml" => "application/toml",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(media_type)
}
