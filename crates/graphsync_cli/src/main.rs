//! graphsync CLI
//!
//! Moves compose resource graphs in and out of a store snapshot.
//!
//! # Commands
//!
//! - `decode` - Print the resources of a snapshot as JSON
//! - `apply` - Encode a JSON manifest into a snapshot
//! - `provision` - Register authentication providers from the environment

mod commands;
mod manifest;

use clap::{Parser, Subcommand};
use graphsync_engine::MergeStrategy;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// graphsync command-line tools.
#[derive(Parser)]
#[command(name = "graphsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store snapshot
    #[arg(global = true, short, long)]
    snapshot: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resources of a snapshot as JSON
    Decode {
        /// Only decode this namespace (slug)
        #[arg(short, long)]
        namespace: Option<String>,

        /// Include records
        #[arg(short, long)]
        records: bool,

        /// Rows fetched per store call
        #[arg(long, default_value = "1000")]
        page_size: u32,
    },

    /// Encode a JSON manifest into a snapshot
    Apply {
        /// Manifest file
        #[arg(short, long)]
        manifest: PathBuf,

        /// Policy for resources that already exist
        #[arg(short, long, default_value = "replace")]
        on_existing: MergeStrategy,

        /// Skip predicate evaluated before every write
        #[arg(long)]
        skip_if: Option<String>,

        /// Encode without saving the snapshot
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Register authentication providers from the environment
    Provision,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Decode {
            namespace,
            records,
            page_size,
        } => {
            let path = cli.snapshot.ok_or("Snapshot path required for decode")?;
            commands::decode::run(&path, namespace.as_deref(), records, page_size)?;
        }
        Commands::Apply {
            manifest,
            on_existing,
            skip_if,
            dry_run,
        } => {
            let path = cli.snapshot.ok_or("Snapshot path required for apply")?;
            let opts = commands::apply::ApplyOptions {
                on_existing,
                skip_if,
                dry_run,
            };
            commands::apply::run(&path, &manifest, &opts)?;
        }
        Commands::Provision => {
            commands::provision::run()?;
        }
        Commands::Version => {
            println!("graphsync {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
