use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::DateTime;
use clap::{Parser, Subcommand};

use crate::indexer::{DEFAULT_RESULT_LIMIT, search};
use crate::ingest::{StderrProgress, import_archives};
use crate::reconcile::ImportMode;
use crate::storage::{DatasetStore, DirStore};

#[derive(Parser)]
#[command(name = "chatvault")]
#[command(version = "0.1.0")]
#[command(about = "Import and search chat-export archives", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import export archives into a dataset directory
    Import {
        /// Archive files, directories, or glob patterns
        #[arg(required = true)]
        inputs: Vec<String>,
        /// Dataset output directory
        #[arg(long, short)]
        out: PathBuf,
        /// Merge policy: upsert, replace, or clone
        #[arg(long, default_value = "upsert")]
        mode: String,
    },
    /// Search an imported dataset
    Search {
        query: String,
        /// Dataset directory
        #[arg(long)]
        data: PathBuf,
        /// Maximum number of hits to print
        #[arg(long, default_value_t = DEFAULT_RESULT_LIMIT)]
        limit: usize,
    },
    /// Show statistics about an imported dataset
    Stats {
        /// Dataset directory
        #[arg(long)]
        data: PathBuf,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Import { inputs, out, mode }) => run_import(inputs, out, mode),
        Some(Commands::Search { query, data, limit }) => run_search(query, data, *limit),
        Some(Commands::Stats { data }) => run_stats(data),
        None => {
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

fn run_import(inputs: &[String], out: &Path, mode: &str) -> Result<()> {
    let mode: ImportMode = mode.parse()?;
    let archives = expand_inputs(inputs)?;
    if archives.is_empty() {
        bail!("No archives matched the given inputs");
    }

    let mut store = DirStore::open(out)?;
    let outcome = import_archives(&mut store, &archives, mode, &StderrProgress)?;

    if outcome.archives_processed == 0 {
        bail!(
            "All {} archive(s) were skipped; nothing was imported",
            outcome.archives_skipped
        );
    }

    println!(
        "Imported {} conversations and {} assets from {} archive(s) into {}",
        outcome.conversations_written,
        outcome.assets_written,
        outcome.archives_processed,
        out.display()
    );
    if outcome.archives_skipped > 0 {
        println!("Skipped {} unreadable archive(s)", outcome.archives_skipped);
    }
    Ok(())
}

/// Expands CLI inputs to an ordered archive list: existing files are taken
/// as-is, directories contribute every `.zip` inside them, anything else is
/// treated as a glob pattern.
fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut archives = Vec::new();

    for input in inputs {
        let path = PathBuf::from(input);
        if path.is_file() {
            archives.push(path);
        } else if path.is_dir() {
            for entry in walkdir::WalkDir::new(&path).sort_by_file_name() {
                let entry = entry
                    .with_context(|| format!("Failed to read directory: {}", path.display()))?;
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|e| e == "zip")
                {
                    archives.push(entry.path().to_path_buf());
                }
            }
        } else {
            let matches =
                glob::glob(input).with_context(|| format!("Invalid glob pattern: {}", input))?;
            for entry in matches {
                let path = entry.context("Failed to expand glob pattern")?;
                if path.is_file() {
                    archives.push(path);
                }
            }
        }
    }

    archives.dedup();
    Ok(archives)
}

fn run_search(query: &str, data: &Path, limit: usize) -> Result<()> {
    let store = DirStore::open(data)?;
    let index = store.load_search_index()?;

    let hits = search(&index, query, limit);
    if hits.is_empty() {
        println!("No results for \"{}\"", query);
        return Ok(());
    }

    for hit in &hits {
        println!(
            "{} [{}] {}:{}:{}",
            hit.title,
            format_time(hit.last_message_time),
            hit.message_id,
            hit.block_index,
            hit.line_number
        );
        println!("  {}[{}]{}", hit.before, hit.matched, hit.after);
    }
    println!("{} result(s)", hits.len());
    Ok(())
}

fn run_stats(data: &Path) -> Result<()> {
    let store = DirStore::open(data)?;
    let summaries = store.load_summaries()?;
    let index = store.load_search_index()?;

    let line_count: usize = index.lines.values().map(Vec::len).sum();

    println!("Dataset statistics");
    println!("==================");
    println!("Conversations: {}", summaries.len());
    println!("Indexed lines: {}", line_count);
    println!("Trigrams: {}", index.postings.len());

    if let Some(newest) = summaries.first() {
        println!("Newest: {} ({})", newest.title, format_time(newest.last_message_time));
    }
    if let Some(oldest) = summaries.last() {
        println!("Oldest: {} ({})", oldest.title, format_time(oldest.last_message_time));
    }
    Ok(())
}

fn format_time(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
