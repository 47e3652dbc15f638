/// API credential loading.
///
/// The credential lives in a TOML file whose path is given by an environment
/// variable, read once when the answering stage starts:
///
/// ```toml
/// OPENAI_API_KEY = "sk-..."
/// ```
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SecretsError {
    #[error("environment variable {0} is not set; it must point at the secrets file")]
    EnvNotSet(String),

    #[error("failed to read secrets file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse secrets file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("key {key} missing or empty in {path}")]
    MissingKey { key: String, path: PathBuf },
}

/// Read `key` from the secrets file named by the `env_var` environment variable.
pub fn load_from_env(env_var: &str, key: &str) -> Result<String, SecretsError> {
    let path = std::env::var_os(env_var)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| SecretsError::EnvNotSet(env_var.to_string()))?;
    load_from_path(Path::new(&path), key)
}

/// Read `key` from a TOML secrets file. The value must be a non-empty string.
pub fn load_from_path(path: &Path, key: &str) -> Result<String, SecretsError> {
    let data = std::fs::read_to_string(path).map_err(|source| SecretsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let table: toml::Table = data.parse().map_err(|source| SecretsError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let value = table
        .get(key)
        .and_then(toml::Value::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SecretsError::MissingKey {
            key: key.to_string(),
            path: path.to_path_buf(),
        })?;

    info!(path = %path.display(), key, "Loaded API credential");
    Ok(value.to_string())
}
