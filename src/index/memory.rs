use std::sync::Arc;

use super::{IndexError, RetrievedMatch, VectorIndex, check_dimensions};
use crate::embedder::Embedder;
use crate::ingest::IndexedDocument;

/// Brute-force cosine search over documents held in memory.
pub struct InMemoryIndex {
    embedder: Arc<dyn Embedder>,
    entries: Vec<(IndexedDocument, Vec<f32>)>,
}

impl InMemoryIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
        }
    }
}

/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorIndex for InMemoryIndex {
    fn add_documents(&mut self, docs: &[IndexedDocument]) -> Result<usize, IndexError> {
        if docs.is_empty() {
            return Ok(0);
        }
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        check_dimensions(self.embedder.dimensions(), &vectors)?;

        self.entries.extend(docs.iter().cloned().zip(vectors));
        Ok(docs.len())
    }

    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedMatch>, IndexError> {
        let query_vector = self.embedder.embed(query)?;

        let mut scored: Vec<(f32, &IndexedDocument)> = self
            .entries
            .iter()
            .map(|(doc, v)| (cosine_similarity(&query_vector, v), doc))
            .collect();
        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, doc)| RetrievedMatch {
                text: doc.text.clone(),
                metadata: doc.metadata.clone(),
                score,
            })
            .collect())
    }

    fn len(&self) -> Result<usize, IndexError> {
        Ok(self.entries.len())
    }

    fn clear(&mut self) -> Result<(), IndexError> {
        self.entries.clear();
        Ok(())
    }
}
