//! Vector index: stores [`IndexedDocument`]s and answers top-k queries.
//!
//! [`VectorIndex`] is the seam between the pipeline and storage. The
//! persisted implementation is [`SqliteVecIndex`]; [`InMemoryIndex`] keeps
//! everything in a `Vec` and is meant for tests and throwaway sessions.
pub mod memory;
pub mod sqlite;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::embedder::EmbedderError;
use crate::ingest::IndexedDocument;

pub use memory::InMemoryIndex;
pub use sqlite::SqliteVecIndex;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedderError),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("failed to prepare index directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt document metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("embedding has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// One ranked hit from [`VectorIndex::retrieve`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedMatch {
    pub text: String,
    pub metadata: BTreeMap<String, String>,
    /// Cosine similarity to the query; higher is closer.
    pub score: f32,
}

pub trait VectorIndex {
    /// Embed and store `docs`, returning how many were stored.
    fn add_documents(&mut self, docs: &[IndexedDocument]) -> Result<usize, IndexError>;

    /// Up to `k` documents most similar to `query`, best first.
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedMatch>, IndexError>;

    fn len(&self) -> Result<usize, IndexError>;

    fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.len()? == 0)
    }

    /// Drop every stored document.
    fn clear(&mut self) -> Result<(), IndexError>;
}

fn check_dimensions(expected: usize, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
    match vectors.iter().find(|v| v.len() != expected) {
        Some(v) => Err(IndexError::DimensionMismatch {
            expected,
            actual: v.len(),
        }),
        None => Ok(()),
    }
}
