/// Embedder trait and shared types for text embedding.
pub mod download;
pub mod mock;
pub mod onnx;
pub mod tokenizer;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use crate::config::{EmbeddingConfig, EmbeddingProvider};

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("model load failed: {0}")]
    ModelLoadFailed(String),

    #[error("tokenizer error: {0}")]
    TokenizerError(String),
}

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` to allow use behind `Arc`.
pub trait Embedder: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    /// Embed multiple text strings into vectors, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;
}

/// Build the embedder selected by `config`.
///
/// For the ONNX provider, missing model files are downloaded first when
/// `auto_download` is set.
pub fn from_config(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider {
        EmbeddingProvider::Mock => {
            info!(dimensions = config.dimensions, "Using mock embedder");
            Ok(Box::new(mock::MockEmbedder::new(config.dimensions)))
        }
        EmbeddingProvider::Onnx => {
            let model_dir = config.model_dir();
            if !download::all_files_present(&model_dir) {
                anyhow::ensure!(
                    config.auto_download,
                    "model files missing in {} and auto_download is disabled",
                    model_dir.display()
                );
                download::download_model_files(&config.model_name, &model_dir)?;
            }
            let embedder = onnx::OnnxEmbedder::new(&model_dir, config.dimensions)
                .with_context(|| format!("failed to load model {}", config.model_name))?;
            Ok(Box::new(embedder))
        }
    }
}

/// L2-normalize a vector in place. Zero vectors are left unchanged.
pub(crate) fn l2_normalize(vec: &mut [f32]) {
    let norm_sq: f32 = vec.iter().map(|v| v * v).sum();
    if norm_sq == 0.0 {
        return;
    }
    let inv = 1.0 / norm_sq.sqrt();
    for v in vec {
        *v *= inv;
    }
}
