//! Finsight Core Library
//!
//! Shared functionality for the finsight personal finance tool:
//! - Text classifier that maps transaction descriptions to categories
//! - Encrypted transaction store (descriptions encrypted at rest)
//! - Insights engine producing a health score and narrative observations
//! - CSV ingestion for uploads and the bulk loader
//! - Service boundary that translates failures for callers

pub mod classifier;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod ingest;
pub mod insights;
pub mod models;
pub mod service;

pub use classifier::{Classifier, ModelArtifact, Prediction};
pub use config::AppConfig;
pub use crypto::Cipher;
pub use db::{BatchMode, Database};
pub use error::{Error, Result};
pub use insights::{generate_insights, health_score, HealthReport};
pub use models::{NewTransaction, RawTransaction, TrainingExample, Transaction, INCOME_CATEGORY};
pub use service::{Resources, Service, ServiceError};
