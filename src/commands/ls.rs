//! # Ls Command Implementation
//!
//! Lists the files each source's patterns match in its existing working
//! copy, one `group<TAB>path` line per match. It never talks to a remote:
//! sources that have not been synchronized yet are skipped with a note.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use git_source::discovery::{self, DiscoveredFile};
use git_source::path::{relative_slash_path, working_copy_path};

use super::SourceArgs;

/// List files matched in synchronized working copies
#[derive(Args, Debug)]
pub struct LsArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Show only the number of matches per source.
    #[arg(long)]
    pub count: bool,
}

/// Execute the `ls` command.
pub fn execute(args: LsArgs) -> Result<()> {
    let sources = args.sources.load()?;
    let cache_dir = args.sources.cache_dir();

    for source in &sources {
        let working_copy = working_copy_path(&cache_dir, &source.name);
        if !working_copy.is_dir() {
            eprintln!(
                "{}: not synchronized yet ({}); run 'git-source sync' first",
                source.name,
                working_copy.display()
            );
            continue;
        }

        let files = discovery::discover(&working_copy, &source.pattern_entries())?;
        if args.count {
            println!("{}: {} file(s)", source.name, files.len());
            continue;
        }

        println!("{}:", source.name);
        for line in listing(&std::path::absolute(&working_copy)?, files) {
            println!("  {}", line);
        }
    }

    Ok(())
}

/// `group<TAB>relative/path` lines, sorted within each group while groups
/// keep their pattern order.
fn listing(root: &Path, files: Vec<DiscoveredFile>) -> Vec<String> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for file in files {
        let relative = relative_slash_path(root, &file.absolute_path);
        match groups.iter_mut().find(|(name, _)| *name == file.group) {
            Some((_, paths)) => paths.push(relative),
            None => groups.push((file.group, vec![relative])),
        }
    }

    groups
        .into_iter()
        .flat_map(|(group, mut paths)| {
            paths.sort();
            paths.into_iter().map(move |p| format!("{}\t{}", group, p))
        })
        .collect()
}
