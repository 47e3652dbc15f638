use super::{Db, serialize_vector};
use rusqlite::{Result, params};

#[derive(Debug)]
pub struct SearchResult {
    pub document_id: i64,
    pub content: String,
    pub metadata_json: String,
    /// Cosine similarity, `1 - cosine distance`.
    pub similarity: f64,
}

fn map_search_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SearchResult> {
    let distance: f64 = row.get(3)?;
    Ok(SearchResult {
        document_id: row.get(0)?,
        content: row.get(1)?,
        metadata_json: row.get(2)?,
        similarity: 1.0 - distance,
    })
}

impl Db {
    /// Nearest documents by cosine distance; ties keep insertion order.
    pub fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                d.id,
                d.content,
                d.metadata,
                vec_distance_cosine(v.embedding, ?) AS distance
            FROM vec_documents v
            JOIN documents d ON v.rowid = d.id
            ORDER BY distance ASC, d.id ASC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(
            params![serialize_vector(query_vector), top_k as i64],
            map_search_row,
        )?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }
}
