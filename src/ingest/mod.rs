pub mod core;
pub mod document;
pub mod loader;

pub use document::{IndexedDocument, build_document};
pub use loader::{LoadError, LoadStats, RecordLoader, RemedyRecord};
