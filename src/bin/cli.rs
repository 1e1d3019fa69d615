//! tripledelta CLI
//!
//! Builds an index from a triple file, locates single triples in one
//! permutation, and replays update files against a fresh delta.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use tripledelta::{
    DeltaTriples, IdTriple, Index, IndexBuilder, IndexConfig, LocatedTriple, Permutation, Result,
    StoreError, Triple,
};

/// tripledelta CLI
#[derive(Parser, Debug)]
#[command(name = "tripledelta-cli")]
#[command(about = "Triple index with a located delta overlay")]
#[command(version)]
struct Args {
    /// Index directory
    #[arg(short, long, default_value = "./tripledelta_index")]
    index_dir: PathBuf,

    /// Skip block checksum verification on reads
    #[arg(long)]
    no_verify: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build an index from a file with one triple per line
    Build {
        /// Input file
        #[arg(short = 'f', long)]
        input: PathBuf,

        /// Rows per block
        #[arg(short, long, default_value = "4096")]
        block_size: usize,
    },

    /// Print where a triple is (or would be) in one permutation
    Locate {
        /// Permutation to search (PSO, POS, SPO, SOP, OSP, OPS)
        #[arg(short, long, default_value = "PSO")]
        permutation: Permutation,

        subject: String,
        predicate: String,
        object: String,
    },

    /// Apply `+ S P O` / `- S P O` lines as pending changes
    Apply {
        /// Update file
        #[arg(short, long)]
        updates: PathBuf,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tripledelta=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    tracing::debug!("tripledelta v{}", tripledelta::VERSION);

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = IndexConfig::builder()
        .index_dir(&args.index_dir)
        .verify_checksums(!args.no_verify);

    match args.command {
        Commands::Build { input, block_size } => {
            let config = config.block_size(block_size).build();
            let triples = read_triples(&input)?;
            let summary = IndexBuilder::new(config)?.build(triples)?;
            println!(
                "Built index with {} triples and {} terms",
                summary.num_triples, summary.num_terms
            );
            for file in &summary.files {
                println!(
                    "  {:<4} {:>8} blocks {:>10} bytes",
                    file.permutation, file.num_blocks, file.file_size
                );
            }
        }

        Commands::Locate {
            permutation,
            subject,
            predicate,
            object,
        } => {
            let index = Index::open(&config.build())?;
            let triple = Triple::new(subject, predicate, object);
            let [s, p, o] = triple.terms().map(|term| index.vocabulary().id_of(term));
            match (s, p, o) {
                (Some(s), Some(p), Some(o)) => {
                    let located = LocatedTriple::locate_triple(
                        &IdTriple::new(s, p, o),
                        permutation,
                        index.permutation(permutation),
                    )?;
                    println!("{}", located);
                }
                _ => println!("{} uses terms unknown to the index", triple),
            }
        }

        Commands::Apply { updates } => {
            let index = Arc::new(Index::open(&config.build())?);
            let mut delta = DeltaTriples::new(index);
            apply_updates(&mut delta, &updates)?;

            let counts = delta.counts();
            println!(
                "{} pending inserts, {} pending deletes",
                counts.triples_inserted, counts.triples_deleted
            );
            for (permutation, located) in delta.located_triples().iter() {
                println!(
                    "  {:<4} {:>6} triples in {:>6} blocks",
                    permutation,
                    located.num_triples(),
                    located.num_blocks()
                );
            }
        }
    }

    Ok(())
}

fn read_triples(path: &Path) -> Result<Vec<Triple>> {
    let reader = BufReader::new(File::open(path)?);
    let mut triples = Vec::new();
    for line in reader.lines() {
        if let Some(triple) = Triple::parse_line(&line?)? {
            triples.push(triple);
        }
    }
    Ok(triples)
}

fn apply_updates(delta: &mut DeltaTriples, path: &Path) -> Result<()> {
    let reader = BufReader::new(File::open(path)?);
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (insert, rest) = if let Some(rest) = line.strip_prefix('+') {
            (true, rest)
        } else if let Some(rest) = line.strip_prefix('-') {
            (false, rest)
        } else {
            return Err(StoreError::Parse(format!(
                "line {}: expected '+' or '-': {}",
                number + 1,
                line
            )));
        };
        let Some(triple) = Triple::parse_line(rest)? else {
            continue;
        };

        let result = if insert {
            delta.insert_triple(&triple)
        } else {
            delta.delete_triple(&triple)
        };
        match result {
            Ok(()) => {}
            Err(e) if e.is_update_rejection() => {
                tracing::warn!("line {}: {}", number + 1, e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
