/// Configuration module for semrank.
///
/// Handles loading, validating, and providing default configuration values.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::embedder::download::{MODEL_DIMENSIONS, MODEL_ID};

/// Config file used when no explicit path is given.
pub const DEFAULT_CONFIG_PATH: &str = "semrank.json";

// ── Default value functions ──────────────────────────────────────────

fn default_catalog_path() -> String {
    "products.csv".to_string()
}

fn default_trending_count() -> usize {
    3
}

fn default_threads() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_model_name() -> String {
    MODEL_ID.to_string()
}

fn default_dimensions() -> usize {
    MODEL_DIMENSIONS
}

fn default_model_dir() -> String {
    format!("models/{MODEL_ID}")
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    #[serde(default = "default_trending_count")]
    pub trending_count: usize,

    #[serde(default)]
    pub compute: ComputeConfig,

    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ComputeConfig {
    #[serde(default = "default_threads")]
    pub intra_threads: usize,

    #[serde(default = "default_threads")]
    pub inter_threads: usize,
}

/// Which embedding backend to construct.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Onnx,
    Mock,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_model_dir")]
    pub dir: String,

    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default = "default_true")]
    pub auto_download: bool,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            trending_count: default_trending_count(),
            compute: ComputeConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            intra_threads: default_threads(),
            inter_threads: default_threads(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            dimensions: default_dimensions(),
            dir: default_model_dir(),
            provider: ProviderKind::default(),
            auto_download: default_true(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to [`DEFAULT_CONFIG_PATH`].
    /// If the file does not exist, returns a default config and generates a
    /// template file when the default path is in use.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            DEFAULT_CONFIG_PATH
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            if path == DEFAULT_CONFIG_PATH {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// The model identifier is pinned: swapping it would change every
    /// similarity value downstream, so only [`MODEL_ID`] is accepted.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.trending_count > 0, "trending_count must be positive");
        anyhow::ensure!(
            !self.catalog_path.trim().is_empty(),
            "catalog_path must not be empty"
        );
        anyhow::ensure!(
            self.model.name == MODEL_ID,
            "unsupported model {:?}, only {MODEL_ID} is supported",
            self.model.name
        );
        anyhow::ensure!(
            self.model.dimensions > 0,
            "model.dimensions must be positive"
        );
        // The ONNX export's hidden size is fixed; only the mock can vary it.
        anyhow::ensure!(
            self.model.provider == ProviderKind::Mock || self.model.dimensions == MODEL_DIMENSIONS,
            "model.dimensions must be {MODEL_DIMENSIONS} for {MODEL_ID}, got {}",
            self.model.dimensions
        );
        anyhow::ensure!(
            self.compute.intra_threads > 0 && self.compute.inter_threads > 0,
            "compute thread counts must be positive"
        );
        Ok(())
    }

    /// Directory holding the model files.
    #[must_use]
    pub fn model_dir(&self) -> PathBuf {
        PathBuf::from(&self.model.dir)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.catalog_path, "products.csv");
        assert_eq!(config.trending_count, 3);
        assert_eq!(config.model.dimensions, 384);
        assert_eq!(config.model.name, "all-MiniLM-L6-v2");
        assert_eq!(config.model.provider, ProviderKind::Onnx);
        assert!(config.model.auto_download);
        assert_eq!(config.compute.intra_threads, 4);
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"catalog_path": "./data/items.csv", "model": {"provider": "mock"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.catalog_path, "./data/items.csv");
        assert_eq!(config.model.provider, ProviderKind::Mock);
        // Other fields should have defaults
        assert_eq!(config.trending_count, 3);
        assert_eq!(config.model.name, MODEL_ID);
    }

    #[test]
    fn test_validate_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_other_model() {
        let mut config = Config::default();
        config.model.name = "bge-small-en".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_onnx_dimensions_pinned() {
        let mut config = Config::default();
        config.model.dimensions = 512;
        assert!(config.validate().is_err());

        // The mock backend produces whatever size it is asked for.
        config.model.provider = ProviderKind::Mock;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_trending_count() {
        let mut config = Config::default();
        config.trending_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.trending_count, 3);
        // Templates are only written for the default path
        assert!(!path.exists());
    }

    #[test]
    fn test_load_invalid_json_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.catalog_path, "products.csv");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semrank.json");
        let path = path.to_str().unwrap();

        let mut config = Config::default();
        config.trending_count = 5;
        config.save(path).unwrap();

        let loaded = Config::load(path).unwrap();
        assert_eq!(loaded.trending_count, 5);
        assert_eq!(loaded.model.dir, config.model.dir);
    }
}
