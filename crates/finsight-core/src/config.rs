//! Application configuration
//!
//! Config is loaded with a three-layer resolution:
//! 1. Explicit path (e.g. `--config`), if given and present
//! 2. Override in the data dir (~/.local/share/finsight/config.toml)
//! 3. Embedded defaults (compiled into binary)
//!
//! `FINSIGHT_DATA_DIR` replaces the data directory used to resolve relative paths.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/finsight.toml");

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "FINSIGHT_DATA_DIR";

/// Hyperparameters for the text classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, serde::Serialize)]
pub struct ClassifierConfig {
    pub max_features: usize,
    pub n_trees: usize,
    pub seed: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_features: 100,
            n_trees: 100,
            seed: 42,
        }
    }
}

/// Thresholds used when phrasing insights
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct InsightsConfig {
    pub low_savings_rate: f64,
    pub top_category_share: f64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            low_savings_rate: 10.0,
            top_category_share: 0.30,
        }
    }
}

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database: PathBuf,
    pub key_file: PathBuf,
    pub model_file: PathBuf,
    pub classifier: ClassifierConfig,
    pub insights: InsightsConfig,
}

impl AppConfig {
    /// Load configuration using the standard resolution order
    pub fn load(config_path: Option<&Path>, data_dir: Option<&Path>) -> Result<Self> {
        let content = read_config(config_path)?;
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_data_dir(),
        };
        parse_config(&content, data_dir)
    }

    /// Embedded defaults rooted at `data_dir` (for tests and first runs)
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self> {
        parse_config(DEFAULT_CONFIG, data_dir.into())
    }
}

/// Data directory: `FINSIGHT_DATA_DIR`, else the platform local data dir, else cwd
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::data_local_dir()
        .map(|d| d.join("finsight"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("finsight").join("config.toml"))
}

fn read_config(explicit: Option<&Path>) -> Result<String> {
    // An explicitly named file must exist; only the default override is optional
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file {} not found",
                path.display()
            )));
        }
        return read_file(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => read_file(&path),
        _ => Ok(DEFAULT_CONFIG.to_string()),
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config {}: {}", path.display(), e)))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    paths: Option<RawPaths>,
    classifier: Option<RawClassifier>,
    insights: Option<RawInsights>,
}

#[derive(Debug, Deserialize)]
struct RawPaths {
    database: Option<PathBuf>,
    key_file: Option<PathBuf>,
    model_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawClassifier {
    max_features: Option<usize>,
    n_trees: Option<usize>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawInsights {
    low_savings_rate: Option<f64>,
    top_category_share: Option<f64>,
}

/// Parse config from TOML content
fn parse_config(content: &str, data_dir: PathBuf) -> Result<AppConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let paths = raw.paths.unwrap_or(RawPaths {
        database: None,
        key_file: None,
        model_file: None,
    });
    let resolve = |p: Option<PathBuf>, fallback: &str| {
        let p = p.unwrap_or_else(|| PathBuf::from(fallback));
        if p.is_absolute() {
            p
        } else {
            data_dir.join(p)
        }
    };

    let mut classifier = ClassifierConfig::default();
    if let Some(c) = raw.classifier {
        if let Some(v) = c.max_features {
            classifier.max_features = v;
        }
        if let Some(v) = c.n_trees {
            classifier.n_trees = v;
        }
        if let Some(v) = c.seed {
            classifier.seed = v;
        }
    }
    if classifier.max_features == 0 || classifier.n_trees == 0 {
        return Err(Error::Config(
            "classifier.max_features and classifier.n_trees must be positive".to_string(),
        ));
    }

    let mut insights = InsightsConfig::default();
    if let Some(i) = raw.insights {
        if let Some(v) = i.low_savings_rate {
            insights.low_savings_rate = v;
        }
        if let Some(v) = i.top_category_share {
            insights.top_category_share = v;
        }
    }

    Ok(AppConfig {
        database: resolve(paths.database, "finsight.db"),
        key_file: resolve(paths.key_file, "secret.key"),
        model_file: resolve(paths.model_file, "model.json"),
        data_dir,
        classifier,
        insights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults() {
        let config = AppConfig::with_data_dir("/tmp/fs").unwrap();
        assert_eq!(config.classifier, ClassifierConfig::default());
        assert_eq!(config.database, PathBuf::from("/tmp/fs/finsight.db"));
        assert_eq!(config.key_file, PathBuf::from("/tmp/fs/secret.key"));
        assert_eq!(config.model_file, PathBuf::from("/tmp/fs/model.json"));
        assert_eq!(config.insights.low_savings_rate, 10.0);
    }

    #[test]
    fn test_partial_override() {
        let content = r#"
            [paths]
            key_file = "/etc/finsight/key"

            [classifier]
            n_trees = 10
        "#;
        let config = parse_config(content, PathBuf::from("/data")).unwrap();
        assert_eq!(config.key_file, PathBuf::from("/etc/finsight/key"));
        assert_eq!(config.database, PathBuf::from("/data/finsight.db"));
        assert_eq!(config.classifier.n_trees, 10);
        assert_eq!(config.classifier.max_features, 100);
        assert_eq!(config.classifier.seed, 42);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            parse_config("not = [valid", PathBuf::from(".")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_zero_trees_rejected() {
        let content = "[classifier]\nn_trees = 0\n";
        assert!(parse_config(content, PathBuf::from(".")).is_err());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[classifier]\nseed = 7\n").unwrap();
        let config = AppConfig::load(Some(&path), Some(dir.path())).unwrap();
        assert_eq!(config.classifier.seed, 7);
        assert_eq!(config.data_dir, dir.path());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.toml");
        let err = AppConfig::load(Some(&path), Some(dir.path())).unwrap_err();
        match err {
            Error::Config(msg) => assert!(msg.contains("typo.toml")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
