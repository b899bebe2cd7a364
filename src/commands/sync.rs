//! # Sync Command Implementation
//!
//! Runs the ingestion pipeline for every configured source (or the ones
//! picked with `--source`). Records are written as JSON lines to stdout or
//! to `--output`. A one-line summary per source goes to stderr.
//!
//! Sources run one after another. A halted source does not stop the
//! others, but the command exits non-zero if any source halted.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use log::debug;

use git_source::error::{Error, ErrorKind};
use git_source::output::{emoji, format_halt, format_summary, OutputConfig};
use git_source::pipeline::{IngestionPipeline, RunStatus};
use git_source::sink::{JsonLinesSink, Reporter};
use git_source::suggestions;

use super::SourceArgs;

/// Synchronize working copies and emit records
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Write records to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Prints the halting error of a source to stderr.
struct ConsoleReporter {
    output: OutputConfig,
}

impl Reporter for ConsoleReporter {
    fn report(&self, source: &str, error: &Error) {
        debug!("reporting {} for source '{}'", error.kind(), source);
        eprintln!(
            "{} {}: {}",
            emoji(&self.output, "⚠️ ", "error:"),
            source,
            error
        );
    }
}

/// Execute the `sync` command.
pub fn execute(args: SyncArgs, output: &OutputConfig) -> Result<()> {
    let sources = args.sources.load()?;
    let cache_dir = args.sources.cache_dir();
    debug!("using cache directory {}", cache_dir.display());

    let writer: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        )),
        None => Box::new(io::stdout()),
    };
    let sink = Arc::new(JsonLinesSink::new(writer));
    let pipeline = IngestionPipeline::new(&cache_dir, sink.clone()).with_reporter(Arc::new(
        ConsoleReporter {
            output: output.clone(),
        },
    ));

    let mut halted = 0;
    for source in &sources {
        match pipeline.run(source) {
            RunStatus::Completed(summary) => eprintln!("{}", format_summary(output, &summary)),
            RunStatus::Halted(kind) => {
                halted += 1;
                eprintln!("{}", format_halt(output, &source.name, kind));
                if kind == ErrorKind::SyncConflict {
                    eprintln!(
                        "{}",
                        suggestions::sync_conflict_hint(
                            &source.name,
                            &pipeline.working_copy(&source.name)
                        )
                    );
                }
            }
        }
    }

    sink.flush().context("Failed to flush records")?;

    if halted > 0 {
        anyhow::bail!("{} of {} source(s) halted", halted, sources.len());
    }
    Ok(())
}
