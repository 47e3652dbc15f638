/// Configuration module for remedyrag.
///
/// Handles loading, validating, and providing default configuration values.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

// ── Default value functions ──────────────────────────────────────────

fn default_index_dir() -> String {
    "./remedy_index".to_string()
}

fn default_top_k() -> usize {
    3
}

fn default_ingest_batch_size() -> usize {
    32
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_true() -> bool {
    true
}

fn default_chat_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_secrets_path_env() -> String {
    "REMEDY_SECRETS_PATH".to_string()
}

fn default_api_key_name() -> String {
    "OPENAI_API_KEY".to_string()
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Directory holding the persisted vector index.
    #[serde(default = "default_index_dir")]
    pub index_dir: String,

    /// Matches retrieved per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Documents embedded and stored per index call during ingestion.
    #[serde(default = "default_ingest_batch_size")]
    pub ingest_batch_size: usize,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Onnx,
    Mock,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    /// sentence-transformers model name on the Hugging Face hub.
    #[serde(default = "default_embedding_model")]
    pub model_name: String,

    /// Defaults to `models/<model_name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<String>,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_true")]
    pub auto_download: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default)]
    pub temperature: f32,

    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable naming the TOML secrets file.
    #[serde(default = "default_secrets_path_env")]
    pub secrets_path_env: String,

    /// Key of the API credential inside the secrets file.
    #[serde(default = "default_api_key_name")]
    pub api_key_name: String,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
            top_k: default_top_k(),
            ingest_batch_size: default_ingest_batch_size(),
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            model_name: default_embedding_model(),
            model_dir: None,
            dimensions: default_dimensions(),
            auto_download: default_true(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
            temperature: 0.0,
            api_base: default_api_base(),
            secrets_path_env: default_secrets_path_env(),
            api_key_name: default_api_key_name(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If the default file does not exist, returns defaults and writes a
    /// template. A missing explicit path or invalid JSON falls back to
    /// defaults with a warning.
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
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.top_k > 0, "top_k must be positive");
        anyhow::ensure!(
            self.ingest_batch_size > 0,
            "ingest_batch_size must be positive"
        );
        anyhow::ensure!(!self.index_dir.is_empty(), "index_dir must be set");
        anyhow::ensure!(
            self.embedding.dimensions > 0,
            "embedding.dimensions must be positive"
        );
        anyhow::ensure!(
            !self.embedding.model_name.is_empty(),
            "embedding.model_name must be set"
        );
        anyhow::ensure!(
            !self.generation.model.is_empty(),
            "generation.model must be set"
        );
        anyhow::ensure!(
            (0.0..=2.0).contains(&self.generation.temperature),
            "generation.temperature must be within [0, 2]"
        );
        Ok(())
    }

    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        PathBuf::from(&self.index_dir)
    }
}

impl EmbeddingConfig {
    #[must_use]
    pub fn model_dir(&self) -> PathBuf {
        match &self.model_dir {
            Some(dir) => PathBuf::from(dir),
            None => Path::new("models").join(&self.model_name),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.index_dir, "./remedy_index");
        assert_eq!(config.embedding.provider, EmbeddingProvider::Onnx);
        assert_eq!(config.embedding.model_name, "all-MiniLM-L6-v2");
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.generation.temperature, 0.0);
        assert_eq!(config.generation.secrets_path_env, "REMEDY_SECRETS_PATH");
        assert_eq!(config.generation.api_key_name, "OPENAI_API_KEY");
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"top_k": 5, "embedding": {"provider": "mock", "dimensions": 64}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.embedding.provider, EmbeddingProvider::Mock);
        assert_eq!(config.embedding.dimensions, 64);
        // Other fields should have defaults
        assert_eq!(config.embedding.model_name, "all-MiniLM-L6-v2");
        assert_eq!(config.generation.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, r#"{"index_dir": "/tmp/remedies"}"#).unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.index_dir, "/tmp/remedies");
        assert_eq!(config.top_k, 3);
    }

    #[test]
    fn test_load_invalid_json_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.top_k, 3);
    }

    #[test]
    fn test_load_missing_custom_path_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.top_k, 3);
        assert!(!path.exists());
    }

    #[test]
    fn test_validate_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_top_k() {
        let mut config = Config::default();
        config.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_temperature() {
        let mut config = Config::default();
        config.generation.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_model_dir_default_and_override() {
        let mut embedding = EmbeddingConfig::default();
        assert_eq!(embedding.model_dir(), Path::new("models/all-MiniLM-L6-v2"));
        embedding.model_dir = Some("/opt/models/minilm".into());
        assert_eq!(embedding.model_dir(), Path::new("/opt/models/minilm"));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.index_dir, config.index_dir);
        assert_eq!(parsed.embedding.model_name, config.embedding.model_name);
        assert_eq!(parsed.generation.api_base, config.generation.api_base);
    }
}
