//! Vector database module using SQLite and sqlite-vec
use rusqlite::{Connection, Result};
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;
use tracing::info;

pub mod documents;
pub mod models;
pub mod search;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}',
    indexed_at DATETIME NOT NULL
);
"#;

static INIT_VEC: Once = Once::new();

/// Initialize the sqlite-vec extension. Safe to call multiple times.
fn init_sqlite_vec() {
    INIT_VEC.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// The embedding table's DDL; its width is fixed when the table is created.
fn vec_schema_sql(dimensions: usize) -> String {
    format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS vec_documents USING vec0(embedding FLOAT[{dimensions}]);"
    )
}

/// A SQLite connection initialized with sqlite-vec and the index schema.
pub struct Db {
    pub(crate) conn: Connection,
    dimensions: usize,
}

impl Db {
    /// Open (or create) an index database at `path` storing `dimensions`-wide vectors.
    pub fn open<P: AsRef<Path>>(path: P, dimensions: usize) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening index database: {}", path.display());

        init_sqlite_vec();
        Self::init(Connection::open(path)?, dimensions)
    }

    /// Open an in-memory database connection (useful for testing).
    pub fn open_in_memory(dimensions: usize) -> Result<Self> {
        init_sqlite_vec();
        Self::init(Connection::open_in_memory()?, dimensions)
    }

    fn init(conn: Connection, dimensions: usize) -> Result<Self> {
        let vec_version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
        info!("sqlite-vec version: {}", vec_version);

        conn.execute_batch(SCHEMA_SQL)?;
        conn.execute_batch(&vec_schema_sql(dimensions))?;

        let dimensions = stored_dimensions(&conn)?.unwrap_or(dimensions);
        Ok(Self { conn, dimensions })
    }

    /// Width of the stored embedding table. For an existing database this is
    /// the width it was created with, not the one passed to `open`.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Read the `FLOAT[n]` width back from the embedding table's DDL.
fn stored_dimensions(conn: &Connection) -> Result<Option<usize>> {
    let sql: String = conn.query_row(
        "SELECT sql FROM sqlite_master WHERE name = 'vec_documents'",
        [],
        |row| row.get(0),
    )?;
    Ok(parse_vec_width(&sql))
}

fn parse_vec_width(sql: &str) -> Option<usize> {
    let (_, rest) = sql.split_once("FLOAT[")?;
    let (width, _) = rest.split_once(']')?;
    width.trim().parse().ok()
}

/// Helper to serialize a float32 vector into bytes for vec0 virtual table
pub fn serialize_vector(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_init() {
        let db = Db::open_in_memory(8).expect("Failed to open in-memory DB");

        let tables: usize = db
            .conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name IN ('documents', 'vec_documents');",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(tables, 2);
        assert_eq!(db.dimensions(), 8);
    }

    #[test]
    fn test_reopen_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        drop(Db::open(&path, 4).unwrap());
        let db = Db::open(&path, 4).unwrap();
        assert_eq!(db.count_documents().unwrap(), 0);
    }

    #[test]
    fn test_reopen_keeps_stored_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        drop(Db::open(&path, 64).unwrap());
        let db = Db::open(&path, 32).unwrap();
        assert_eq!(db.dimensions(), 64);
    }

    #[test]
    fn test_parse_vec_width() {
        assert_eq!(parse_vec_width(&vec_schema_sql(384)), Some(384));
        assert_eq!(
            parse_vec_width("CREATE VIRTUAL TABLE vec_documents USING vec0(embedding FLOAT[16])"),
            Some(16)
        );
        assert_eq!(parse_vec_width("CREATE TABLE t (x)"), None);
    }

    #[test]
    fn test_vec_schema_sql() {
        assert!(vec_schema_sql(384).contains("FLOAT[384]"));
    }

    #[test]
    fn test_serialize_vector() {
        let vec = vec![1.0, 2.0, -3.5];
        let bytes = serialize_vector(&vec);
        assert_eq!(bytes.len(), 12);

        // 1.0f32 in hex: 0x3f800000 -> little endian: 00 00 80 3f
        assert_eq!(&bytes[0..4], &[0x00, 0x00, 0x80, 0x3f]);
        // 2.0f32 in hex: 0x40000000 -> little endian: 00 00 00 40
        assert_eq!(&bytes[4..8], &[0x00, 0x00, 0x00, 0x40]);
        // -3.5f32 in hex: 0xc0600000 -> little endian: 00 00 60 c0
        assert_eq!(&bytes[8..12], &[0x00, 0x00, 0x60, 0xc0]);
    }
}
