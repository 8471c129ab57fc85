//! Status command: reference store statistics.

use anyhow::Result;
use colored::Colorize;
use hashward_core::{Config, SignatureStore};

pub fn execute(config: &Config) -> Result<()> {
    let store = SignatureStore::open(&config.store_dir)?;
    let db = store.snapshot();

    println!("{} {}", "store:".dimmed(), store.root().display());
    println!("{} {}", "references:".dimmed(), db.len());
    println!("{} {}", "skipped:".dimmed(), db.skipped());
    Ok(())
}
