//! # Ingestion Pipeline
//!
//! Drives one run for one configured source:
//!
//! 1. Validate the configuration (no I/O yet).
//! 2. Synchronize the working copy at `<cache>/gatsby-source-git/<name>`.
//! 3. Read remote metadata and build the remote descriptor.
//! 4. Resolve patterns and discover files in the working copy.
//! 5. Build one file record per discovered file, linked to the descriptor.
//! 6. Validate every record, then emit the descriptor followed by the file
//!    records.
//!
//! Runs are all-or-nothing. Every record is built and validated before the
//! first one reaches the sink, so any failure in steps 1-6 leaves the sink
//! untouched. The halting error goes to the [`Reporter`] and the run returns
//! [`RunStatus::Halted`].
//!
//! Steps 2-4 run strictly in order because each reads what the previous one
//! left on disk. File-record construction and emission run in parallel and
//! all finish before a run counts as completed. Runs for different source
//! names are independent; overlapping runs for the same name are not safe
//! and must be serialized by the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use rayon::prelude::*;

use crate::config::SourceConfig;
use crate::discovery::{self, DiscoveredFile};
use crate::error::{ErrorKind, Result};
use crate::path::working_copy_path;
use crate::records::{FileNodeFactory, FileRecord, Node, NodeId, RemoteDescriptor, StatFileNodeFactory};
use crate::remote;
use crate::repository::{RepositoryManager, SyncOutcome, SyncTarget};
use crate::sink::{LogReporter, NodeSink, Reporter};

/// How many files one pattern group contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub name: String,
    pub files: usize,
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub name: String,
    pub working_copy: PathBuf,
    pub sync: SyncOutcome,
    pub remote_id: NodeId,
    pub files_emitted: usize,
    /// Per-group counts in pattern order.
    pub groups: Vec<GroupCount>,
}

/// Result of [`IngestionPipeline::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Completed(RunSummary),
    /// The run stopped before emitting anything; the error was reported.
    Halted(ErrorKind),
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed(_))
    }
}

/// Every record of a run, built and validated but not yet emitted.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub working_copy: PathBuf,
    pub sync: SyncOutcome,
    pub remote: RemoteDescriptor,
    pub files: Vec<FileRecord>,
    pub groups: Vec<GroupCount>,
}

/// Orchestrates sync, metadata, discovery and emission for sources.
pub struct IngestionPipeline {
    cache_dir: PathBuf,
    repositories: RepositoryManager,
    file_factory: Arc<dyn FileNodeFactory>,
    sink: Arc<dyn NodeSink>,
    reporter: Arc<dyn Reporter>,
}

impl IngestionPipeline {
    /// A pipeline using the system `git`, filesystem stat records and the
    /// logging reporter.
    pub fn new(cache_dir: impl Into<PathBuf>, sink: Arc<dyn NodeSink>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            repositories: RepositoryManager::new(),
            file_factory: Arc::new(StatFileNodeFactory),
            sink,
            reporter: Arc::new(LogReporter),
        }
    }

    pub fn with_repository_manager(mut self, repositories: RepositoryManager) -> Self {
        self.repositories = repositories;
        self
    }

    pub fn with_file_factory(mut self, file_factory: Arc<dyn FileNodeFactory>) -> Self {
        self.file_factory = file_factory;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where the working copy for `name` lives.
    pub fn working_copy(&self, name: &str) -> PathBuf {
        working_copy_path(&self.cache_dir, name)
    }

    /// Runs the whole pipeline for one source. Never panics on expected
    /// failures; they are reported and turned into [`RunStatus::Halted`].
    pub fn run(&self, config: &SourceConfig) -> RunStatus {
        info!("starting run for source '{}'", config.name);

        let result = self.prepare(config).and_then(|prepared| {
            self.emit(&prepared)?;
            Ok(prepared)
        });

        match result {
            Ok(prepared) => {
                let summary = RunSummary {
                    name: config.name.clone(),
                    working_copy: prepared.working_copy,
                    sync: prepared.sync,
                    remote_id: prepared.remote.id,
                    files_emitted: prepared.files.len(),
                    groups: prepared.groups,
                };
                info!(
                    "source '{}' emitted 1 remote and {} file record(s)",
                    summary.name, summary.files_emitted
                );
                RunStatus::Completed(summary)
            }
            Err(error) => {
                self.reporter.report(&config.name, &error);
                RunStatus::Halted(error.kind())
            }
        }
    }

    /// Steps 1-5: sync the working copy and build every record without
    /// emitting anything.
    pub fn prepare(&self, config: &SourceConfig) -> Result<PreparedRun> {
        config.validate()?;
        let entries = config.pattern_entries();

        let working_copy = self.working_copy(&config.name);
        let target = SyncTarget::new(&working_copy, config.remote.as_str(), config.branch_spec());
        let sync = self.repositories.sync(&target)?;
        debug!("source '{}' {}", config.name, sync);

        let metadata = remote::describe(self.repositories.git_ops(), &working_copy, &config.remote)?;
        let remote = RemoteDescriptor::new(&config.name, &metadata)?;

        let discovered = discovery::discover(&working_copy, &entries)?;
        let root = std::path::absolute(&working_copy)?;
        let files = discovered
            .par_iter()
            .map(|file| self.build_record(file, &root, &remote.id))
            .collect::<Result<Vec<_>>>()?;

        let mut groups: Vec<GroupCount> = Vec::new();
        for entry in &entries {
            if !groups.iter().any(|g| g.name == entry.name) {
                groups.push(GroupCount {
                    name: entry.name.clone(),
                    files: 0,
                });
            }
        }
        for file in &discovered {
            if let Some(group) = groups.iter_mut().find(|g| g.name == file.group) {
                group.files += 1;
            }
        }

        Ok(PreparedRun {
            working_copy,
            sync,
            remote,
            files,
            groups,
        })
    }

    /// Step 6: validate everything, then hand the records to the sink.
    pub fn emit(&self, prepared: &PreparedRun) -> Result<()> {
        let remote_id = &prepared.remote.id;
        let remote = Node::Remote(prepared.remote.clone());
        let files: Vec<Node> = prepared.files.iter().cloned().map(Node::File).collect();

        remote.validate(remote_id)?;
        files.par_iter().try_for_each(|node| node.validate(remote_id))?;

        self.sink.create_node(&remote)?;
        files
            .par_iter()
            .try_for_each(|node| self.sink.create_node(node))
    }

    fn build_record(&self, file: &DiscoveredFile, root: &Path, remote: &NodeId) -> Result<FileRecord> {
        let node = self
            .file_factory
            .create_file_node(&file.absolute_path, root, &file.group)?;
        Ok(FileRecord::new(node, remote))
    }
}
