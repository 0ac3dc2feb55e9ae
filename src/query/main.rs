//! Read-only access to a gazetteer repository.
//!
//! `resolve` matches parsed hierarchies without creating anything, `tree`
//! prints the catalogue below a node.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use gazetteer::{AddressRepository, ParsedAddressHierarchy, RepositoryConfig};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Query a gazetteer repository")]
struct Args {
    /// Repository directory
    #[arg(short, long)]
    repo: PathBuf,

    /// Repository config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log every resolution step
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve JSON-lines hierarchies and print the matched ids
    Resolve {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Print the subtree below a node
    Tree {
        /// Parent node id (root when omitted)
        #[arg(long)]
        parent: Option<u64>,

        #[arg(long, default_value = "2")]
        depth: usize,
    },
}

#[derive(Serialize)]
struct ResolvedItem {
    spelling: String,
    level: String,
    node: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => RepositoryConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RepositoryConfig::default(),
    };
    if !args.repo.exists() {
        anyhow::bail!("Repository {} does not exist", args.repo.display());
    }
    let mut repo = AddressRepository::open(&args.repo, config)
        .with_context(|| format!("Failed to open repository {}", args.repo.display()))?;

    match args.command {
        Command::Resolve { file } => resolve(&mut repo, &file)?,
        Command::Tree { parent, depth } => {
            if let Some(id) = parent {
                match repo.get_object(id)? {
                    Some(node) => println!("{}", node),
                    None => anyhow::bail!("No node with id {}", id),
                }
            }
            print_tree(&repo, parent, depth, 0)?;
        }
    }

    repo.close().context("Failed to close repository")?;
    Ok(())
}

fn resolve(repo: &mut AddressRepository, file: &Path) -> Result<()> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?,
    );
    let mut total = 0usize;
    let mut complete = 0usize;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut hierarchy: ParsedAddressHierarchy = match serde_json::from_str(&line) {
            Ok(h) => h,
            Err(e) => {
                warn!("Line {}: {}", lineno + 1, e);
                continue;
            }
        };
        total += 1;

        let resolved = repo.search(&mut hierarchy)?;
        if resolved == hierarchy.items.len() {
            complete += 1;
        }
        let items: Vec<ResolvedItem> = hierarchy
            .items
            .iter()
            .map(|it| ResolvedItem {
                spelling: it.spelling(),
                level: it.level.to_string(),
                node: it.resolved_node,
            })
            .collect();
        println!("{}", serde_json::to_string(&items)?);
    }

    info!("Resolved {} of {} hierarchies completely", complete, total);
    Ok(())
}

fn print_tree(
    repo: &AddressRepository,
    parent: Option<u64>,
    depth: usize,
    indent: usize,
) -> Result<()> {
    if depth == 0 {
        return Ok(());
    }
    for node in repo.get_objects(parent)? {
        let level = node.level.map(|l| l.description()).unwrap_or("");
        println!(
            "{}{} [{}] ({} children)",
            "  ".repeat(indent + 1),
            node,
            level,
            node.child_ids.len()
        );
        print_tree(repo, Some(node.id), depth - 1, indent + 1)?;
    }
    Ok(())
}
