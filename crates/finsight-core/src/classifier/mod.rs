//! Transaction description classifier
//!
//! A term-weighting vectorizer feeds a seeded random forest that maps a free-text
//! description to one of the labels in the training corpus. The fitted model is
//! persisted as a portable JSON artifact (vocabulary, idf weights, tree nodes)
//! so later processes reuse it without retraining.
//!
//! The [`Classifier`] handle materializes the model lazily: the first call to
//! [`Classifier::classify`] loads the artifact, or trains and saves one if it is
//! missing or unreadable. Initialization is serialized, so concurrent first use
//! trains exactly once per handle.

pub mod corpus;
pub mod forest;
pub mod vectorizer;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ClassifierConfig;
use crate::error::{Error, Result};
use crate::models::TrainingExample;

pub use corpus::seed_corpus;
use forest::{argmax, RandomForest};
use vectorizer::TfidfVectorizer;

/// Bumped whenever the artifact layout changes
pub const ARTIFACT_VERSION: u32 = 1;

/// Category and confidence for one input description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub description: String,
    pub category: String,
    /// Highest per-class probability, in [0, 1]
    pub confidence: f64,
}

/// Fitted classifier pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub params: ClassifierConfig,
    labels: Vec<String>,
    vectorizer: TfidfVectorizer,
    forest: RandomForest,
}

impl ModelArtifact {
    /// Fit the pipeline. Deterministic for a fixed corpus and params.
    pub fn train(corpus: &[TrainingExample], params: ClassifierConfig) -> Result<Self> {
        if corpus.is_empty() {
            return Err(Error::Training("Training corpus is empty".to_string()));
        }

        let mut labels: Vec<String> = corpus.iter().map(|e| e.category.clone()).collect();
        labels.sort();
        labels.dedup();

        let descriptions: Vec<&str> = corpus.iter().map(|e| e.description.as_str()).collect();
        let vectorizer = TfidfVectorizer::fit(&descriptions, params.max_features);
        if vectorizer.n_features() == 0 {
            return Err(Error::Training(
                "Training corpus produced an empty vocabulary".to_string(),
            ));
        }

        let rows: Vec<Vec<f64>> = descriptions.iter().map(|d| vectorizer.transform(d)).collect();
        let targets: Vec<usize> = corpus
            .iter()
            .map(|e| labels.binary_search(&e.category).unwrap_or(0))
            .collect();

        let forest = RandomForest::fit(&rows, &targets, labels.len(), params.n_trees, params.seed);

        Ok(Self {
            version: ARTIFACT_VERSION,
            params,
            labels,
            vectorizer,
            forest,
        })
    }

    /// The closed set of labels this model can emit
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn vocabulary(&self) -> &[String] {
        self.vectorizer.vocabulary()
    }

    /// Predict one result per description, in input order
    ///
    /// Empty or unknown text still yields the forest's most probable class for
    /// an all-zero feature row.
    pub fn predict<S: AsRef<str>>(&self, descriptions: &[S]) -> Vec<Prediction> {
        descriptions
            .iter()
            .map(|d| {
                let description = d.as_ref();
                let proba = self
                    .forest
                    .predict_proba(&self.vectorizer.transform(description));
                let best = argmax(&proba);
                Prediction {
                    description: description.to_string(),
                    category: self.labels[best].clone(),
                    confidence: proba[best],
                }
            })
            .collect()
    }

    /// Read an artifact, rejecting other versions or inconsistent contents
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let artifact: Self = serde_json::from_str(&content)?;

        if artifact.version != ARTIFACT_VERSION {
            return Err(Error::InvalidData(format!(
                "Model artifact version {} (expected {})",
                artifact.version, ARTIFACT_VERSION
            )));
        }
        if artifact.labels.is_empty()
            || !artifact.vectorizer.is_consistent()
            || !artifact
                .forest
                .is_consistent(artifact.vectorizer.n_features(), artifact.labels.len())
        {
            return Err(Error::InvalidData(
                "Model artifact is internally inconsistent".to_string(),
            ));
        }
        Ok(artifact)
    }

    /// Write the artifact atomically (temp file in the same dir, then rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer(&mut tmp, self)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

/// Shared handle that owns the lazily materialized model
pub struct Classifier {
    model_path: PathBuf,
    params: ClassifierConfig,
    corpus: Vec<TrainingExample>,
    model: Mutex<Option<Arc<ModelArtifact>>>,
}

impl Classifier {
    /// Classifier over the built-in seed corpus
    pub fn new(model_path: impl Into<PathBuf>, params: ClassifierConfig) -> Self {
        Self::with_corpus(model_path, params, seed_corpus())
    }

    /// Classifier that trains on a custom corpus when no artifact exists
    pub(crate) fn with_corpus(
        model_path: impl Into<PathBuf>,
        params: ClassifierConfig,
        corpus: Vec<TrainingExample>,
    ) -> Self {
        Self {
            model_path: model_path.into(),
            params,
            corpus,
            model: Mutex::new(None),
        }
    }

    /// Whether a model is already loaded in this handle
    pub fn is_loaded(&self) -> bool {
        self.model.lock().map(|m| m.is_some()).unwrap_or(false)
    }

    /// Get the model, loading or training it on first use
    pub fn model(&self) -> Result<Arc<ModelArtifact>> {
        let mut slot = self
            .model
            .lock()
            .map_err(|_| Error::Training("Model lock poisoned".to_string()))?;

        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        let model = match self.load_persisted() {
            Ok(model) => model,
            Err(Error::ModelNotTrained(reason)) => {
                info!(reason = %reason, "Training classifier on first use");
                self.train_and_save()?
            }
            Err(e) => return Err(e),
        };

        let model = Arc::new(model);
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Classify descriptions, preserving input order and length
    pub fn classify<S: AsRef<str>>(&self, descriptions: &[S]) -> Result<Vec<Prediction>> {
        let model = self.model()?;
        Ok(model.predict(descriptions))
    }

    /// Retrain from the corpus and overwrite the persisted artifact
    pub fn retrain(&self) -> Result<Arc<ModelArtifact>> {
        let mut slot = self
            .model
            .lock()
            .map_err(|_| Error::Training("Model lock poisoned".to_string()))?;
        let model = Arc::new(self.train_and_save()?);
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Missing or unusable artifacts are reported as `ModelNotTrained`
    fn load_persisted(&self) -> Result<ModelArtifact> {
        if !self.model_path.exists() {
            return Err(Error::ModelNotTrained(format!(
                "no artifact at {}",
                self.model_path.display()
            )));
        }
        match ModelArtifact::load(&self.model_path) {
            Ok(model) if model.params == self.params => Ok(model),
            Ok(_) => Err(Error::ModelNotTrained(
                "artifact was trained with different parameters".to_string(),
            )),
            Err(e) => {
                warn!(
                    path = %self.model_path.display(),
                    error = %e,
                    "Discarding unreadable model artifact"
                );
                Err(Error::ModelNotTrained(e.to_string()))
            }
        }
    }

    fn train_and_save(&self) -> Result<ModelArtifact> {
        let started = Instant::now();
        let model = ModelArtifact::train(&self.corpus, self.params)?;
        model.save(&self.model_path)?;
        info!(
            examples = self.corpus.len(),
            labels = model.labels().len(),
            features = model.vocabulary().len(),
            trees = self.params.n_trees,
            elapsed_ms = started.elapsed().as_millis() as u64,
            path = %self.model_path.display(),
            "Classifier trained and saved"
        );
        Ok(model)
    }
}
