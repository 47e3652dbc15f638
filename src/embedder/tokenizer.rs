/// Sentence-transformer tokenizer wrapper around HuggingFace `tokenizers`.
///
/// Produces padded batches laid out row-major, ready to be fed to ONNX
/// Runtime as `[batch, seq_len]` tensors.
use std::path::Path;

use anyhow::Result;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

/// all-MiniLM-L6-v2 was trained with 256-token inputs.
pub const DEFAULT_MAX_LENGTH: usize = 256;

pub struct SentenceTokenizer {
    inner: Tokenizer,
}

/// A tokenized batch, padded to its longest member.
#[derive(Debug, Clone)]
pub struct TokenBatch {
    pub batch_size: usize,
    pub seq_len: usize,
    /// `batch_size * seq_len` token ids.
    pub input_ids: Vec<i64>,
    /// `batch_size * seq_len` mask values, 1 for real tokens.
    pub attention_mask: Vec<i64>,
}

impl SentenceTokenizer {
    /// Load `tokenizer.json` from the model directory.
    pub fn from_model_dir(model_dir: &Path, max_length: usize) -> Result<Self> {
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {}",
            model_dir.display()
        );

        let mut inner = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;

        inner
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("invalid truncation settings: {e}"))?;

        inner.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        Ok(Self { inner })
    }

    /// Tokenize `texts` into one padded batch.
    pub fn encode_batch(&self, texts: &[&str]) -> Result<TokenBatch> {
        let encodings = self
            .inner
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("failed to encode batch: {e}"))?;

        let seq_len = encodings.first().map_or(0, |e| e.get_ids().len());
        let mut input_ids = Vec::with_capacity(encodings.len() * seq_len);
        let mut attention_mask = Vec::with_capacity(encodings.len() * seq_len);

        for enc in &encodings {
            anyhow::ensure!(
                enc.get_ids().len() == seq_len,
                "batch padding produced ragged rows"
            );
            input_ids.extend(enc.get_ids().iter().map(|&id| i64::from(id)));
            attention_mask.extend(enc.get_attention_mask().iter().map(|&m| i64::from(m)));
        }

        Ok(TokenBatch {
            batch_size: encodings.len(),
            seq_len,
            input_ids,
            attention_mask,
        })
    }

    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run with: cargo test tokenizer -- --ignored
    #[test]
    #[ignore]
    fn test_encode_batch_with_real_model() {
        let model_dir = Path::new("models/all-MiniLM-L6-v2");
        if !model_dir.join("tokenizer.json").exists() {
            eprintln!("Skipping: model files not downloaded");
            return;
        }

        let tokenizer = SentenceTokenizer::from_model_dir(model_dir, DEFAULT_MAX_LENGTH).unwrap();
        let batch = tokenizer
            .encode_batch(&["cough", "a much longer sentence about a sore throat"])
            .unwrap();

        assert_eq!(batch.batch_size, 2);
        assert_eq!(batch.input_ids.len(), 2 * batch.seq_len);
        // The short row is padded, so its mask sums below seq_len.
        let first_row: i64 = batch.attention_mask[..batch.seq_len].iter().sum();
        assert!((first_row as usize) < batch.seq_len);
    }

    #[test]
    fn test_tokenizer_missing_file() {
        let result = SentenceTokenizer::from_model_dir(Path::new("/nonexistent/path"), 256);
        assert!(result.is_err());
    }
}
