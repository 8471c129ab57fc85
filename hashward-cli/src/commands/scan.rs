//! Scan command: check one image file against the reference store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use hashward_core::{check_bytes, Config, SignatureStore};
use tracing::info;

/// Exit code used when the candidate matches a reference.
const MATCH_EXIT_CODE: i32 = 2;

pub async fn execute(config: &Config, file: PathBuf, json: bool) -> Result<()> {
    let store = SignatureStore::open(&config.store_dir)?;
    let bytes =
        std::fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;

    info!(path = %file.display(), bytes = bytes.len(), "scanning candidate");

    let db = store.snapshot();
    let matcher = config.matcher.clone();
    let outcome = tokio::task::spawn_blocking(move || check_bytes(&bytes, &db, &matcher)).await?;

    match outcome {
        Some(hit) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&hit)?);
            } else {
                println!("{} {}", "MATCH".red().bold(), file.display());
                println!("   {} {}", "reference:".dimmed(), hit.reference);
                println!("   {} {}", "reason:".dimmed(), hit.reason);
                println!("   {} {}", "rotation:".dimmed(), hit.rotation);
            }
            std::process::exit(MATCH_EXIT_CODE);
        }
        None => {
            if json {
                println!("null");
            } else {
                println!("{} {}", "NO MATCH".green().bold(), file.display());
            }
            Ok(())
        }
    }
}
