//! # Cache Command Implementation
//!
//! Inspects and removes the working copies under
//! `<cache-dir>/gatsby-source-git/`.
//!
//! ## Subcommands
//!
//! - **`list`**: every working copy with its origin, checked-out ref and size
//! - **`clean`**: remove one (`--name`) or all (`--all`) working copies. This
//!   is how a sync conflict is resolved: clear the stale copy, sync again.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm};
use serde::Serialize;
use walkdir::WalkDir;

use git_source::path::{is_safe_segment, namespace_dir};
use git_source::repository::{DefaultGitOperations, GitOperations};
use git_source::suggestions;

use super::resolve_cache_dir;

/// Manage working copies
#[derive(Args, Debug)]
pub struct CacheArgs {
    /// Directory holding the working copies.
    ///
    /// Defaults to the system cache directory (e.g. `~/.cache/git-source` on
    /// Linux).
    #[arg(long, value_name = "DIR", env = "GIT_SOURCE_CACHE")]
    pub cache_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// List all working copies
    List(ListArgs),
    /// Remove working copies
    Clean(CleanArgs),
}

/// Arguments for the cache list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the cache clean command
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Remove the working copy of this source. Can be repeated.
    #[arg(long, value_name = "NAME")]
    pub name: Vec<String>,

    /// Remove every working copy
    #[arg(long)]
    pub all: bool,

    /// Show what would be deleted without actually deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt and delete immediately
    #[arg(short, long)]
    pub yes: bool,
}

/// One working copy found under the namespace directory.
#[derive(Debug, Clone, Serialize)]
struct WorkingCopyEntry {
    name: String,
    path: PathBuf,
    origin: Option<String>,
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    size: u64,
    file_count: usize,
}

/// Execute the `cache` command.
pub fn execute(args: CacheArgs) -> Result<()> {
    let namespace = namespace_dir(&resolve_cache_dir(args.cache_dir));
    match args.command {
        CacheSubcommand::List(list_args) => execute_list(&namespace, list_args),
        CacheSubcommand::Clean(clean_args) => execute_clean(&namespace, clean_args),
    }
}

fn execute_list(namespace: &Path, args: ListArgs) -> Result<()> {
    let entries = scan_working_copies(namespace, &DefaultGitOperations)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No working copies found in: {}", namespace.display());
        return Ok(());
    }

    println!("Working copies in {}:\n", namespace.display());
    println!("{:<20} {:<16} {:>10}  {}", "NAME", "REF", "SIZE", "ORIGIN");
    println!("{}", "-".repeat(80));
    for entry in &entries {
        println!(
            "{:<20} {:<16} {:>10}  {}",
            entry.name,
            entry.git_ref.as_deref().unwrap_or("(unknown)"),
            format_size(entry.size),
            entry.origin.as_deref().unwrap_or("(not a git repository)")
        );
    }
    println!("\nTotal: {} working copies", entries.len());

    Ok(())
}

fn execute_clean(namespace: &Path, args: CleanArgs) -> Result<()> {
    if !args.all && args.name.is_empty() {
        return Err(suggestions::cache_clean_no_filter());
    }
    if let Some(bad) = args.name.iter().find(|n| !is_safe_segment(n)) {
        anyhow::bail!("Invalid source name: {}", bad);
    }

    let entries = scan_working_copies(namespace, &DefaultGitOperations)?;
    let to_delete = select_for_cleanup(&entries, &args);

    for missing in args
        .name
        .iter()
        .filter(|n| !entries.iter().any(|e| &e.name == *n))
    {
        println!("No working copy named '{}'", missing);
    }

    if to_delete.is_empty() {
        println!("Nothing to clean in: {}", namespace.display());
        return Ok(());
    }

    println!("Working copies to be deleted:\n");
    for entry in &to_delete {
        println!(
            "  {} ({}) {}",
            entry.name,
            format_size(entry.size),
            entry.path.display()
        );
    }
    let total: u64 = to_delete.iter().map(|e| e.size).sum();
    println!("\nTotal: {} entries ({})", to_delete.len(), format_size(total));

    if args.dry_run {
        println!("\n🔎 Dry run mode - no changes were made.");
        return Ok(());
    }

    if !args.yes {
        if !console::Term::stdout().is_term() {
            anyhow::bail!("Refusing to delete without confirmation\n\nhint: Pass --yes to skip the prompt");
        }
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Delete these working copies?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Clean cancelled.");
            return Ok(());
        }
    }

    for entry in &to_delete {
        fs::remove_dir_all(&entry.path)
            .with_context(|| format!("Failed to delete {}", entry.path.display()))?;
        println!("  ✅ Deleted: {}", entry.name);
    }

    Ok(())
}

fn select_for_cleanup(entries: &[WorkingCopyEntry], args: &CleanArgs) -> Vec<WorkingCopyEntry> {
    entries
        .iter()
        .filter(|e| args.all || args.name.contains(&e.name))
        .cloned()
        .collect()
}

/// Reads every directory under `namespace`, sorted by name.
fn scan_working_copies(namespace: &Path, git: &dyn GitOperations) -> Result<Vec<WorkingCopyEntry>> {
    if !namespace.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for dir_entry in fs::read_dir(namespace)
        .with_context(|| format!("Failed to read {}", namespace.display()))?
    {
        let dir_entry = dir_entry?;
        let path = dir_entry.path();
        if !path.is_dir() {
            continue;
        }

        let is_repo = path.join(".git").exists();
        let (size, file_count) = directory_size(&path);
        entries.push(WorkingCopyEntry {
            name: dir_entry.file_name().to_string_lossy().into_owned(),
            origin: is_repo.then(|| git.remote_url(&path).ok()).flatten(),
            git_ref: is_repo.then(|| git.current_ref(&path).ok()).flatten(),
            path,
            size,
            file_count,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn directory_size(path: &Path) -> (u64, usize) {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .fold((0, 0), |(size, count), e| {
            let len = e.metadata().map(|m| m.len()).unwrap_or(0);
            (size + len, count + 1)
        })
}

/// Format size in human-readable format
fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
