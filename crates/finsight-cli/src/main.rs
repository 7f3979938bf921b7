//! Finsight CLI - Transaction classifier and financial health reports
//!
//! Usage:
//!   finsight init                                Create key, database and model
//!   finsight upload --user U --file CSV          Classify and store an upload
//!   finsight load --file CSV [--atomic]          Bulk reload pre-categorized rows
//!   finsight score --user U                      Financial health score

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let config = commands::load_config(cli.config.as_deref(), cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Init => commands::cmd_init(&config),
        Commands::Train => commands::cmd_train(&config),
        Commands::Categorize { descriptions, json } => {
            commands::cmd_categorize(&config, &descriptions, json)
        }
        Commands::Register { user, email } => commands::cmd_register(&config, &user, &email),
        Commands::Users => commands::cmd_users(&config),
        Commands::Upload { user, file } => commands::cmd_upload(&config, &user, &file),
        Commands::Add {
            user,
            date,
            description,
            amount,
            category,
        } => commands::cmd_add(&config, user, date, description, amount, category),
        Commands::Load { file, atomic } => commands::cmd_load(&config, &file, atomic),
        Commands::List { user, json } => commands::cmd_list(&config, &user, json),
        Commands::Score { user } => commands::cmd_score(&config, &user),
        Commands::Insights { user } => commands::cmd_insights(&config, &user),
        Commands::Report { user } => commands::cmd_report(&config, &user),
    }
}
