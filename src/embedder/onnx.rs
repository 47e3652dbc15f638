/// ONNX Runtime sentence embedder using the `ort` crate.
///
/// Runs a sentence-transformers export (all-MiniLM-L6-v2 by default) over a
/// padded batch, mean-pools the last hidden state under the attention mask
/// and L2-normalizes each row.
use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use super::tokenizer::{DEFAULT_MAX_LENGTH, SentenceTokenizer, TokenBatch};
use super::{Embedder, EmbedderError, l2_normalize};

pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: SentenceTokenizer,
    dimensions: usize,
}

impl OnnxEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    ///
    /// `dimensions` must match the model's hidden size.
    pub fn new(model_dir: &Path, dimensions: usize) -> Result<Self, EmbedderError> {
        let model_path = model_dir.join("model.onnx");

        if !model_path.exists() {
            return Err(EmbedderError::ModelLoadFailed(format!(
                "model.onnx not found in {}",
                model_dir.display()
            )));
        }

        info!(model = %model_path.display(), "Loading ONNX model");

        let session = Session::builder()
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("session builder error: {e}")))?
            .with_intra_threads(4)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("thread config error: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("model load error: {e}")))?;

        let tokenizer = SentenceTokenizer::from_model_dir(model_dir, DEFAULT_MAX_LENGTH)
            .map_err(|e| EmbedderError::TokenizerError(e.to_string()))?;

        info!(vocab = tokenizer.vocab_size(), dimensions, "ONNX embedder ready");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimensions,
        })
    }

    fn run_batch(&self, batch: &TokenBatch) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let shape = [batch.batch_size, batch.seq_len];
        let input_ids = Tensor::from_array((shape, batch.input_ids.clone()))
            .map_err(|e| EmbedderError::InferenceFailed(format!("input_ids error: {e}")))?;
        let attention_mask = Tensor::from_array((shape, batch.attention_mask.clone()))
            .map_err(|e| EmbedderError::InferenceFailed(format!("attention_mask error: {e}")))?;
        let token_type_ids = Tensor::from_array((shape, vec![0i64; batch.input_ids.len()]))
            .map_err(|e| EmbedderError::InferenceFailed(format!("token_type_ids error: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| EmbedderError::InferenceFailed(format!("lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids,
            ])
            .map_err(|e| EmbedderError::InferenceFailed(e.to_string()))?;

        // last_hidden_state: [batch, seq_len, hidden]
        let (_shape, hidden) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbedderError::InferenceFailed(format!("output extraction: {e}")))?;

        let expected = batch.batch_size * batch.seq_len * self.dimensions;
        if hidden.len() != expected {
            return Err(EmbedderError::InferenceFailed(format!(
                "model produced {} values, expected {expected} for hidden size {}",
                hidden.len(),
                self.dimensions
            )));
        }

        Ok(mean_pool_rows(
            hidden,
            &batch.attention_mask,
            batch.batch_size,
            batch.seq_len,
            self.dimensions,
        ))
    }
}

impl Embedder for OnnxEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| EmbedderError::InferenceFailed("empty model output".into()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batch = self
            .tokenizer
            .encode_batch(texts)
            .map_err(|e| EmbedderError::TokenizerError(e.to_string()))?;
        debug!(batch = batch.batch_size, seq_len = batch.seq_len, "running embedding batch");

        self.run_batch(&batch)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Masked mean over the sequence axis, one normalized vector per row.
///
/// `hidden` is flat `[batch, seq_len, hidden_size]`, `mask` is flat
/// `[batch, seq_len]`.
fn mean_pool_rows(
    hidden: &[f32],
    mask: &[i64],
    batch: usize,
    seq_len: usize,
    hidden_size: usize,
) -> Vec<Vec<f32>> {
    (0..batch)
        .map(|b| {
            let mut pooled = vec![0.0f32; hidden_size];
            let mut count = 0.0f32;
            for t in 0..seq_len {
                let m = mask[b * seq_len + t] as f32;
                if m == 0.0 {
                    continue;
                }
                count += m;
                let row = &hidden[(b * seq_len + t) * hidden_size..][..hidden_size];
                for (acc, h) in pooled.iter_mut().zip(row) {
                    *acc += h * m;
                }
            }
            if count > 0.0 {
                for v in &mut pooled {
                    *v /= count;
                }
            }
            l2_normalize(&mut pooled);
            pooled
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_pool_single_token() {
        let pooled = mean_pool_rows(&[3.0, 4.0], &[1], 1, 1, 2);
        assert!((pooled[0][0] - 0.6).abs() < 1e-6);
        assert!((pooled[0][1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_mean_pool_ignores_padding() {
        // Row 0: tokens [1,0] and padding [100,100]. Row 1: [0,2] and [0,4].
        let hidden = vec![1.0, 0.0, 100.0, 100.0, 0.0, 2.0, 0.0, 4.0];
        let mask = vec![1, 0, 1, 1];
        let pooled = mean_pool_rows(&hidden, &mask, 2, 2, 2);
        assert_eq!(pooled.len(), 2);
        assert_eq!(pooled[0], vec![1.0, 0.0]);
        assert_eq!(pooled[1], vec![0.0, 1.0]);
    }

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = OnnxEmbedder::new(dir.path(), 384).err().unwrap();
        assert!(matches!(err, EmbedderError::ModelLoadFailed(_)));
    }

    /// Integration test requiring actual model files.
    #[test]
    #[ignore]
    fn test_onnx_embed_batch() {
        let model_dir = Path::new("models/all-MiniLM-L6-v2");
        if !model_dir.join("model.onnx").exists() {
            eprintln!("Skipping: model files not downloaded");
            return;
        }

        let embedder = OnnxEmbedder::new(model_dir, 384).unwrap();
        let results = embedder
            .embed_batch(&["honey soothes a cough", "cough remedy", "sunburn"])
            .unwrap();
        assert_eq!(results.len(), 3);
        for v in &results {
            assert_eq!(v.len(), 384);
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 0.01);
        }
        let sim = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(sim(&results[0], &results[1]) > sim(&results[0], &results[2]));
    }
}
