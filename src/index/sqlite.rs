use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::{IndexError, RetrievedMatch, VectorIndex, check_dimensions};
use crate::db::Db;
use crate::db::models::NewDocument;
use crate::embedder::Embedder;
use crate::ingest::IndexedDocument;

/// File created inside the index directory.
pub const INDEX_FILE: &str = "index.db";

/// A [`VectorIndex`] persisted as SQLite + sqlite-vec inside a directory.
pub struct SqliteVecIndex {
    db: Db,
    embedder: Arc<dyn Embedder>,
}

impl SqliteVecIndex {
    /// Open the index in `dir`, creating the directory and database as needed.
    pub fn open<P: AsRef<Path>>(dir: P, embedder: Arc<dyn Embedder>) -> Result<Self, IndexError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let db = Db::open(dir.join(INDEX_FILE), embedder.dimensions())?;
        ensure_width(&db, embedder.as_ref())?;
        let documents = db.count_documents()?;
        info!(dir = %dir.display(), documents, "Vector index opened");
        Ok(Self { db, embedder })
    }

    /// An index over an in-memory SQLite database.
    pub fn open_in_memory(embedder: Arc<dyn Embedder>) -> Result<Self, IndexError> {
        let db = Db::open_in_memory(embedder.dimensions())?;
        Ok(Self { db, embedder })
    }
}

/// An existing index only accepts vectors as wide as the ones it was built with.
fn ensure_width(db: &Db, embedder: &dyn Embedder) -> Result<(), IndexError> {
    if db.dimensions() != embedder.dimensions() {
        return Err(IndexError::DimensionMismatch {
            expected: db.dimensions(),
            actual: embedder.dimensions(),
        });
    }
    Ok(())
}

impl VectorIndex for SqliteVecIndex {
    fn add_documents(&mut self, docs: &[IndexedDocument]) -> Result<usize, IndexError> {
        if docs.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        check_dimensions(self.db.dimensions(), &vectors)?;

        let rows = docs
            .iter()
            .map(|d| {
                Ok(NewDocument {
                    content: d.text.as_str(),
                    metadata_json: serde_json::to_string(&d.metadata)?,
                })
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;

        let stored = self.db.insert_documents(&rows, &vectors)?;
        debug!(stored, "Stored document batch");
        Ok(stored)
    }

    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedMatch>, IndexError> {
        let query_vector = self.embedder.embed(query)?;
        check_dimensions(self.db.dimensions(), std::slice::from_ref(&query_vector))?;

        self.db
            .search(&query_vector, k)?
            .into_iter()
            .map(|hit| -> Result<RetrievedMatch, IndexError> {
                let metadata: BTreeMap<String, String> = serde_json::from_str(&hit.metadata_json)?;
                Ok(RetrievedMatch {
                    text: hit.content,
                    metadata,
                    score: hit.similarity as f32,
                })
            })
            .collect()
    }

    fn len(&self) -> Result<usize, IndexError> {
        Ok(self.db.count_documents()?)
    }

    fn clear(&mut self) -> Result<(), IndexError> {
        self.db.clear()?;
        info!("Vector index cleared");
        Ok(())
    }
}
