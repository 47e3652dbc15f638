use super::{Db, models::NewDocument, serialize_vector};
use chrono::Utc;
use rusqlite::{Result, params};

impl Db {
    /// Number of stored documents.
    pub fn count_documents(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Appends documents and their embeddings in one transaction.
    ///
    /// Rows are never merged: inserting the same content twice stores it
    /// twice.
    pub fn insert_documents(
        &mut self,
        docs: &[NewDocument<'_>],
        embeddings: &[Vec<f32>],
    ) -> Result<usize> {
        assert_eq!(
            docs.len(),
            embeddings.len(),
            "documents and embeddings length mismatch"
        );

        let indexed_at = Utc::now();
        let tx = self.conn.transaction()?;

        for (doc, embedding) in docs.iter().zip(embeddings) {
            tx.execute(
                "INSERT INTO documents (content, metadata, indexed_at) VALUES (?, ?, ?)",
                params![doc.content, doc.metadata_json, indexed_at],
            )?;
            let doc_id = tx.last_insert_rowid();

            tx.execute(
                "INSERT INTO vec_documents (rowid, embedding) VALUES (?, ?)",
                params![doc_id, serialize_vector(embedding)],
            )?;
        }

        tx.commit()?;
        Ok(docs.len())
    }

    /// Removes every document and vector.
    pub fn clear(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM vec_documents", [])?;
        tx.execute("DELETE FROM documents", [])?;
        tx.commit()
    }
}
