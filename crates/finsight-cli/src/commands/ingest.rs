//! Commands that write transactions (upload, add, load)

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use finsight_core::{config::AppConfig, BatchMode, RawTransaction};
use tracing::debug;

use super::open_service;

pub fn cmd_upload(config: &AppConfig, user: &str, file: &Path) -> Result<()> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;

    println!("📥 Uploading {} for {}...", file.display(), user);

    let (_resources, service) = open_service(config)?;
    let stored = service.upload_csv(user, csv_file)?;

    println!("✅ Classified and stored {} transactions", stored);
    Ok(())
}

pub fn cmd_add(
    config: &AppConfig,
    user: String,
    date: String,
    description: String,
    amount: f64,
    category: String,
) -> Result<()> {
    let (_resources, service) = open_service(config)?;
    let id = service.add_transaction(RawTransaction {
        user_id: Some(user),
        date: Some(date),
        description: Some(description),
        amount: Some(amount),
        category: Some(category),
    })?;

    println!("✅ Added transaction #{}", id);
    Ok(())
}

pub fn cmd_load(config: &AppConfig, file: &Path, atomic: bool) -> Result<()> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let mode = if atomic {
        BatchMode::Atomic
    } else {
        BatchMode::PerRow
    };

    debug!(?mode, file = %file.display(), "Bulk load");
    println!("📦 Bulk loading {}...", file.display());
    if !atomic {
        println!("   ⚠️  Rows are written one at a time; use --atomic to roll back on failure");
    }

    let (_resources, service) = open_service(config)?;
    let loaded = service.bulk_reload_csv(csv_file, mode)?;

    println!("✅ Loaded {} transactions", loaded);
    Ok(())
}
