use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::document::{IndexedDocument, build_document};
use super::loader::{LoadStats, RecordLoader};
use crate::index::VectorIndex;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestResult {
    pub lines: usize,
    pub loaded: usize,
    pub malformed: usize,
    pub incomplete: usize,
    pub indexed: usize,
}

impl IngestResult {
    fn from_stats(stats: LoadStats, indexed: usize) -> Self {
        Self {
            lines: stats.lines,
            loaded: stats.loaded,
            malformed: stats.malformed,
            incomplete: stats.incomplete,
            indexed,
        }
    }
}

/// Drives loader → document builder → index.
///
/// Every run appends: ingesting the same source twice stores its documents
/// twice. Clear the index first to rebuild it.
pub struct Ingestor<'a, I: VectorIndex + ?Sized> {
    index: &'a mut I,
    batch_size: usize,
}

impl<'a, I: VectorIndex + ?Sized> Ingestor<'a, I> {
    pub fn new(index: &'a mut I, batch_size: usize) -> Self {
        Self {
            index,
            batch_size: batch_size.max(1),
        }
    }

    /// Ingest a JSONL file.
    pub fn ingest_file<P: AsRef<Path>>(&mut self, path: P) -> Result<IngestResult> {
        let path = path.as_ref();
        info!(path = %path.display(), "Ingesting records");
        let loader = RecordLoader::open(path)?;
        self.ingest_loader(loader)
            .with_context(|| format!("ingestion of {} failed", path.display()))
    }

    /// Ingest JSONL from any buffered reader.
    pub fn ingest_reader<R: BufRead>(&mut self, reader: R) -> Result<IngestResult> {
        self.ingest_loader(RecordLoader::new(reader))
    }

    fn ingest_loader<R: BufRead>(&mut self, mut loader: RecordLoader<R>) -> Result<IngestResult> {
        let mut batch: Vec<IndexedDocument> = Vec::with_capacity(self.batch_size);
        let mut indexed = 0;

        for record in loader.by_ref() {
            batch.push(build_document(&record?));
            if batch.len() == self.batch_size {
                indexed += self.flush(&mut batch)?;
            }
        }
        indexed += self.flush(&mut batch)?;

        let result = IngestResult::from_stats(loader.stats(), indexed);
        info!(
            lines = result.lines,
            loaded = result.loaded,
            malformed = result.malformed,
            incomplete = result.incomplete,
            indexed = result.indexed,
            "Ingestion finished"
        );
        Ok(result)
    }

    fn flush(&mut self, batch: &mut Vec<IndexedDocument>) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }
        let stored = self
            .index
            .add_documents(batch)
            .with_context(|| format!("failed to index a batch of {} documents", batch.len()))?;
        batch.clear();
        Ok(stored)
    }
}
