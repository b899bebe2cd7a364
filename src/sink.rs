//! Destinations for emitted records, and the channel errors are reported on.

use std::io::Write;
use std::sync::Mutex;

use log::error;

use crate::error::{Error, Result};
use crate::records::{FileRecord, Node, RemoteDescriptor};

/// Accepts emitted records. Implementations must tolerate concurrent calls.
pub trait NodeSink: Send + Sync {
    fn create_node(&self, node: &Node) -> Result<()>;
}

/// Collects records in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    nodes: Mutex<Vec<Node>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn nodes(&self) -> Vec<Node> {
        self.nodes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.nodes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remotes(&self) -> Vec<RemoteDescriptor> {
        self.nodes()
            .into_iter()
            .filter_map(|node| match node {
                Node::Remote(remote) => Some(remote),
                Node::File(_) => None,
            })
            .collect()
    }

    pub fn files(&self) -> Vec<FileRecord> {
        self.nodes()
            .into_iter()
            .filter_map(|node| match node {
                Node::File(record) => Some(record),
                Node::Remote(_) => None,
            })
            .collect()
    }
}

impl NodeSink for MemorySink {
    fn create_node(&self, node: &Node) -> Result<()> {
        self.nodes
            .lock()
            .map_err(|_| Error::Emit {
                message: "memory sink lock poisoned".to_string(),
            })?
            .push(node.clone());
        Ok(())
    }
}

/// Writes one JSON document per line.
///
/// Each record is serialized before the lock is taken and written with a
/// single `writeln!`, so concurrent emitters never interleave lines.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.writer
            .lock()
            .map_err(|_| Error::Emit {
                message: "JSON lines sink lock poisoned".to_string(),
            })?
            .flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        let mut writer = self.writer.into_inner().map_err(|_| Error::Emit {
            message: "JSON lines sink lock poisoned".to_string(),
        })?;
        writer.flush()?;
        Ok(writer)
    }
}

impl<W: Write + Send> NodeSink for JsonLinesSink<W> {
    fn create_node(&self, node: &Node) -> Result<()> {
        let line = serde_json::to_string(node)?;
        let mut writer = self.writer.lock().map_err(|_| Error::Emit {
            message: "JSON lines sink lock poisoned".to_string(),
        })?;
        writeln!(writer, "{}", line).map_err(|e| Error::Emit {
            message: format!("failed to write record {}: {}", node.id(), e),
        })
    }
}

/// Receives the error that halted a run.
pub trait Reporter: Send + Sync {
    fn report(&self, source: &str, error: &Error);
}

/// Reports through `log::error!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, source: &str, error: &Error) {
        error!("source '{}' halted ({}): {}", source, error.kind(), error);
    }
}
