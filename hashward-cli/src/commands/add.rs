//! Add command: admit one image into the reference store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use hashward_core::{Config, SignatureStore};

pub fn execute(config: &Config, file: PathBuf) -> Result<()> {
    let store = SignatureStore::open(&config.store_dir)?;

    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no usable file name", file.display()))?
        .to_string();
    let bytes =
        std::fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;

    let count = store.append(&name, &bytes)?;
    println!(
        "{} {} ({} reference{})",
        "added".green().bold(),
        name,
        count,
        if count == 1 { "" } else { "s" }
    );
    Ok(())
}
