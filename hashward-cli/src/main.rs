//! Hashward CLI - match images against a local reference store.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "hashward")]
#[command(author, version, about = "Perceptual-signature matching for spam images", long_about = None)]
struct Cli {
    /// Reference store directory (overrides HASHWARD_STORE_DIR)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an image file against the reference store
    Scan {
        /// Path to the candidate image
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add an image to the reference store
    Add {
        /// Path to the reference image
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show reference store statistics
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = hashward_core::Config::from_env();
    if let Some(store) = cli.store {
        config.store_dir = store;
    }

    match cli.command {
        Commands::Scan { file, json } => commands::scan::execute(&config, file, json).await,
        Commands::Add { file } => commands::add::execute(&config, file),
        Commands::Status => commands::status::execute(&config),
    }
}
