//! Setup command implementations and shared utilities
//!
//! This module contains:
//! - `load_config` / `open_service` - Shared utilities used by every command
//! - `cmd_init` - Create key, database and model
//! - `cmd_train` - Force a retrain
//! - `cmd_register` / `cmd_users` - User registration
//! - `cmd_categorize` - Ad-hoc classification

use std::path::Path;

use anyhow::{Context, Result};
use finsight_core::{config::AppConfig, Resources, Service};

/// Resolve configuration from `--config` / `--data-dir` and the defaults
pub fn load_config(config_path: Option<&Path>, data_dir: Option<&Path>) -> Result<AppConfig> {
    AppConfig::load(config_path, data_dir).context("Failed to load configuration")
}

/// Open the key, database and classifier described by `config`
pub fn open_service(config: &AppConfig) -> Result<(Resources, Service)> {
    let resources = Resources::open(config).with_context(|| {
        format!(
            "Failed to open data directory {}",
            config.data_dir.display()
        )
    })?;
    let service = Service::new(&resources);
    Ok((resources, service))
}

pub fn cmd_init(config: &AppConfig) -> Result<()> {
    println!("🔧 Initializing finsight in {}...", config.data_dir.display());

    let (resources, service) = open_service(config)?;
    println!("   🔒 Key: {} ({})", config.key_file.display(), resources.cipher.fingerprint());
    println!("   Database: {}", config.database.display());

    let model = service.warm_up()?;
    println!(
        "   Model: {} ({} categories, {} terms)",
        config.model_file.display(),
        model.labels().len(),
        model.vocabulary().len()
    );

    println!("✅ Ready!");
    println!();
    println!("Next steps:");
    println!("  1. Upload transactions: finsight upload --user me --file statement.csv");
    println!("  2. Check your score:    finsight score --user me");

    Ok(())
}

pub fn cmd_train(config: &AppConfig) -> Result<()> {
    println!("🧠 Retraining classifier...");

    let (_resources, service) = open_service(config)?;
    let model = service.retrain()?;

    println!(
        "✅ Trained {} trees over {} categories, saved to {}",
        model.params.n_trees,
        model.labels().len(),
        config.model_file.display()
    );
    Ok(())
}

pub fn cmd_register(config: &AppConfig, user: &str, email: &str) -> Result<()> {
    let (_resources, service) = open_service(config)?;
    service.register_user(user, email)?;
    println!("✅ Registered {} <{}>", user, email);
    Ok(())
}

pub fn cmd_users(config: &AppConfig) -> Result<()> {
    let (_resources, service) = open_service(config)?;
    let users = service.list_users()?;

    if users.is_empty() {
        println!("No registered users.");
        return Ok(());
    }
    for user in &users {
        println!("   {:<20} {}", user.user_id, user.email);
    }
    Ok(())
}

pub fn cmd_categorize(config: &AppConfig, descriptions: &[String], json: bool) -> Result<()> {
    let (_resources, service) = open_service(config)?;
    let predictions = service.categorize(descriptions)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&predictions)?);
        return Ok(());
    }

    for p in &predictions {
        println!(
            "   {:<32} → {:<20} {:>5.1}%",
            super::truncate(&p.description, 32),
            p.category,
            p.confidence * 100.0
        );
    }
    Ok(())
}
