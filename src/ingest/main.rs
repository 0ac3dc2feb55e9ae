//! Bulk loader for the address repository.
//!
//! Reads parsed address hierarchies, one JSON object per line, and adds them
//! to the repository, committing periodically.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use gazetteer::{AddressRepository, ParsedAddressHierarchy, RepositoryConfig, NOT_ADMISSIBLE};

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Add parsed address hierarchies to a gazetteer repository")]
struct Args {
    /// Repository directory (created when missing)
    #[arg(short, long)]
    repo: PathBuf,

    /// JSON-lines file of parsed address hierarchies
    #[arg(short, long)]
    file: PathBuf,

    /// Repository config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Commit after this many hierarchies (0 = only at the end)
    #[arg(long, default_value = "10000")]
    commit_every: usize,

    /// Compact the tables after the import
    #[arg(long)]
    optimize: bool,

    /// Log every resolution step
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default)]
struct IngestStats {
    lines: u64,
    created: u64,
    rejected: u64,
    malformed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Gazetteer Ingest");
    info!("File: {}", args.file.display());

    let config = match &args.config {
        Some(path) => RepositoryConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RepositoryConfig::default(),
    };

    // Count lines for the progress bar
    let total = BufReader::new(
        File::open(&args.file)
            .with_context(|| format!("Failed to open {}", args.file.display()))?,
    )
    .lines()
    .count() as u64;

    let mut repo = AddressRepository::open(&args.repo, config)
        .with_context(|| format!("Failed to open repository {}", args.repo.display()))?;
    let start_max = repo.get_max_id()?;

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let reader = BufReader::new(File::open(&args.file)?);
    let mut stats = IngestStats::default();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        pb.inc(1);
        if line.trim().is_empty() {
            continue;
        }
        stats.lines += 1;

        let mut hierarchy: ParsedAddressHierarchy = match serde_json::from_str(&line) {
            Ok(h) => h,
            Err(e) => {
                warn!("Line {}: {}", lineno + 1, e);
                stats.malformed += 1;
                continue;
            }
        };

        let created = repo
            .add(&mut hierarchy)
            .with_context(|| format!("Failed to add line {}", lineno + 1))?;
        if created == NOT_ADMISSIBLE {
            warn!("Line {}: not a top-level address: {}", lineno + 1, hierarchy);
            stats.rejected += 1;
        } else {
            stats.created += created as u64;
        }

        if args.commit_every > 0 && stats.lines % args.commit_every as u64 == 0 {
            repo.commit().context("Commit failed")?;
        }
    }
    pb.finish_with_message("done");

    if args.optimize {
        repo.optimize().context("Optimize failed")?;
    }
    let end_max = repo.get_max_id()?;
    repo.close().context("Failed to close repository")?;

    info!(
        "Ingest complete: {} hierarchies, {} nodes created (max id {} -> {}), {} rejected, {} malformed",
        stats.lines, stats.created, start_max, end_max, stats.rejected, stats.malformed
    );
    Ok(())
}
