//! Service boundary
//!
//! [`Resources`] performs the one guarded startup step (key, database, model
//! handle). [`Service`] runs each operation against those resources and
//! translates core errors into a [`ServiceError`] that is safe to show a
//! caller: validation problems keep their message, a decryption failure names
//! only the user, and everything else is logged and reported generically.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::classifier::{Classifier, ModelArtifact, Prediction};
use crate::config::{AppConfig, InsightsConfig};
use crate::crypto::Cipher;
use crate::db::{BatchMode, Database};
use crate::error::Error;
use crate::ingest::{self, UploadRow};
use crate::insights::HealthReport;
use crate::models::{NewTransaction, RawTransaction, Transaction, User};

/// Caller-facing failure
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Stored data for user '{user_id}' could not be decrypted")]
    Decryption { user_id: String },

    #[error("An internal error occurred")]
    Internal,
}

impl ServiceError {
    /// Translate a core error, logging anything that is not the caller's fault
    fn from_core(err: Error, user_id: Option<&str>) -> Self {
        match err {
            Error::Validation(msg) => ServiceError::Validation(msg),
            Error::Decryption(detail) => {
                let user_id = user_id.unwrap_or("unknown").to_string();
                error!(user_id = %user_id, error = %detail, "Decryption failed");
                ServiceError::Decryption { user_id }
            }
            other => {
                error!(error = %other, "Internal error");
                ServiceError::Internal
            }
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Process-wide resources, initialized once at startup
pub struct Resources {
    pub config: AppConfig,
    pub cipher: Arc<Cipher>,
    pub db: Database,
    pub classifier: Arc<Classifier>,
}

impl Resources {
    /// Create the data directory, load or create the key, open the database
    /// and build the (lazy) classifier handle
    pub fn open(config: &AppConfig) -> crate::Result<Self> {
        for path in [&config.database, &config.key_file, &config.model_file] {
            ensure_parent(path)?;
        }
        fs::create_dir_all(&config.data_dir)?;

        let cipher = Arc::new(Cipher::load_or_create(&config.key_file)?);
        let db = Database::new(&config.database.to_string_lossy(), Arc::clone(&cipher))?;
        let classifier = Arc::new(Classifier::new(&config.model_file, config.classifier));

        info!(
            data_dir = %config.data_dir.display(),
            key = %cipher.fingerprint(),
            "Resources ready"
        );

        Ok(Self {
            config: config.clone(),
            cipher,
            db,
            classifier,
        })
    }
}

fn ensure_parent(path: &Path) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Operations exposed to the CLI (or any other front end)
#[derive(Clone)]
pub struct Service {
    db: Database,
    classifier: Arc<Classifier>,
    insights: InsightsConfig,
}

impl Service {
    pub fn new(resources: &Resources) -> Self {
        Self {
            db: resources.db.clone(),
            classifier: Arc::clone(&resources.classifier),
            insights: resources.config.insights,
        }
    }

    /// Build from parts (for tests and embedding)
    pub fn from_parts(db: Database, classifier: Arc<Classifier>, insights: InsightsConfig) -> Self {
        Self {
            db,
            classifier,
            insights,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Classify descriptions without storing anything
    pub fn categorize<S: AsRef<str>>(&self, descriptions: &[S]) -> ServiceResult<Vec<Prediction>> {
        self.classifier
            .classify(descriptions)
            .map_err(|e| ServiceError::from_core(e, None))
    }

    /// Classify and append parsed upload rows. Returns rows stored.
    ///
    /// Rows are written one at a time; a storage failure part-way leaves the
    /// earlier rows in place.
    pub fn upload(&self, user_id: &str, rows: &[UploadRow]) -> ServiceResult<usize> {
        require_user(user_id)?;
        let result = self
            .classify_rows(user_id, rows)
            .and_then(|txs| self.db.append_transactions(&txs, BatchMode::PerRow));
        let stored = result.map_err(|e| ServiceError::from_core(e, Some(user_id)))?;
        info!(user_id, stored, "Uploaded transactions");
        Ok(stored)
    }

    /// Parse an upload CSV and store it; nothing is written if parsing fails
    pub fn upload_csv<R: Read>(&self, user_id: &str, reader: R) -> ServiceResult<usize> {
        require_user(user_id)?;
        let rows = ingest::parse_upload(reader)
            .map_err(|e| ServiceError::from_core(e, Some(user_id)))?;
        self.upload(user_id, &rows)
    }

    fn classify_rows(
        &self,
        user_id: &str,
        rows: &[UploadRow],
    ) -> crate::Result<Vec<NewTransaction>> {
        let descriptions: Vec<&str> = rows.iter().map(|r| r.description.as_str()).collect();
        let predictions = self.classifier.classify(&descriptions)?;

        Ok(rows
            .iter()
            .zip(predictions)
            .map(|(row, prediction)| NewTransaction {
                user_id: user_id.to_string(),
                date: row.date.clone(),
                description: row.description.clone(),
                amount: row.amount,
                category: prediction.category,
                confidence: Some(prediction.confidence),
            })
            .collect())
    }

    /// Manually add one transaction with a caller-supplied category
    pub fn add_transaction(&self, raw: RawTransaction) -> ServiceResult<i64> {
        let tx = raw
            .validate()
            .map_err(|e| ServiceError::from_core(e, None))?;
        self.db
            .append_transaction(&tx)
            .map_err(|e| ServiceError::from_core(e, Some(&tx.user_id)))
    }

    /// Wipe every user present in `records`, then append them
    pub fn bulk_reload(&self, records: &[NewTransaction], mode: BatchMode) -> ServiceResult<usize> {
        if records.is_empty() {
            warn!("Bulk reload called with no records; nothing cleared");
            return Ok(0);
        }
        let loaded = self
            .db
            .reload_transactions(records, mode)
            .map_err(|e| ServiceError::from_core(e, None))?;
        info!(rows = loaded, ?mode, "Bulk reload complete");
        Ok(loaded)
    }

    /// Parse a bulk CSV and reload it; nothing is cleared if parsing fails
    pub fn bulk_reload_csv<R: Read>(&self, reader: R, mode: BatchMode) -> ServiceResult<usize> {
        let records =
            ingest::parse_bulk(reader).map_err(|e| ServiceError::from_core(e, None))?;
        self.bulk_reload(&records, mode)
    }

    /// A user's decrypted transactions in insertion order
    pub fn dashboard(&self, user_id: &str) -> ServiceResult<Vec<Transaction>> {
        self.db
            .list_transactions(user_id)
            .map_err(|e| ServiceError::from_core(e, Some(user_id)))
    }

    pub fn health_score(&self, user_id: &str) -> ServiceResult<u8> {
        Ok(self.report(user_id)?.score)
    }

    pub fn insights(&self, user_id: &str) -> ServiceResult<Vec<String>> {
        Ok(self.report(user_id)?.insights)
    }

    /// Score and insights computed from a single read
    pub fn report(&self, user_id: &str) -> ServiceResult<HealthReport> {
        let rows = self.dashboard(user_id)?;
        Ok(HealthReport::from_transactions(&rows, &self.insights))
    }

    pub fn register_user(&self, user_id: &str, email: &str) -> ServiceResult<()> {
        self.db
            .register_user(user_id, email)
            .map_err(|e| ServiceError::from_core(e, Some(user_id)))
    }

    pub fn list_users(&self) -> ServiceResult<Vec<User>> {
        self.db
            .list_users()
            .map_err(|e| ServiceError::from_core(e, None))
    }

    /// Retrain from the built-in corpus and overwrite the artifact
    pub fn retrain(&self) -> ServiceResult<Arc<ModelArtifact>> {
        self.classifier
            .retrain()
            .map_err(|e| ServiceError::from_core(e, None))
    }

    /// Load or train the model now instead of on first classification
    pub fn warm_up(&self) -> ServiceResult<Arc<ModelArtifact>> {
        self.classifier
            .model()
            .map_err(|e| ServiceError::from_core(e, None))
    }
}

fn require_user(user_id: &str) -> ServiceResult<()> {
    if user_id.trim().is_empty() {
        return Err(ServiceError::Validation("user_id is required".to_string()));
    }
    Ok(())
}
