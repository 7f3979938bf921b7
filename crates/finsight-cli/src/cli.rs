//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Finsight - Categorize transactions and score financial health
#[derive(Parser)]
#[command(name = "finsight")]
#[command(about = "Personal finance transaction classifier and health scorer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to config.toml in the data dir, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding the key, database and model
    ///
    /// Overrides FINSIGHT_DATA_DIR and the platform default.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory, encryption key, database and model
    Init,

    /// Retrain the classifier from the built-in corpus
    Train,

    /// Predict categories for descriptions without storing anything
    Categorize {
        /// Transaction descriptions
        #[arg(required = true)]
        descriptions: Vec<String>,

        /// Print predictions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Register a user (stores a sealed per-user key)
    Register {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        email: String,
    },

    /// List registered users
    Users,

    /// Classify and store a CSV with date, description and amount columns
    Upload {
        #[arg(short, long)]
        user: String,

        /// CSV file to upload
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Add one transaction with an explicit category
    Add {
        #[arg(short, long)]
        user: String,

        #[arg(long)]
        date: String,

        #[arg(long)]
        description: String,

        #[arg(long, allow_hyphen_values = true)]
        amount: f64,

        #[arg(long)]
        category: String,
    },

    /// Replace every listed user's transactions from a bulk CSV
    ///
    /// Columns: user_id, date, description, amount, category
    Load {
        /// CSV file to load
        #[arg(short, long)]
        file: PathBuf,

        /// Roll back the whole load if any row fails
        #[arg(long)]
        atomic: bool,
    },

    /// List a user's transactions
    List {
        #[arg(short, long)]
        user: String,

        /// Print transactions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a user's financial health score
    Score {
        #[arg(short, long)]
        user: String,
    },

    /// Show narrative insights for a user
    Insights {
        #[arg(short, long)]
        user: String,
    },

    /// Score, breakdown and insights as JSON
    Report {
        #[arg(short, long)]
        user: String,
    },
}
