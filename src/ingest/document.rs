use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::loader::RemedyRecord;

/// Metadata key carrying the record's source URL.
pub const SOURCE_KEY: &str = "source";

/// Source value used when a record has no `source_url`.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// The text + metadata unit handed to the vector index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

impl IndexedDocument {
    /// The `source` metadata value, if set.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// Render a record as the labeled text block the embedder sees.
///
/// Label text and field order are a stored-data format: documents already in
/// an index were embedded from exactly this shape.
#[must_use]
pub fn document_text(record: &RemedyRecord) -> String {
    format!(
        "Symptom: {}\nRemedy: {}\nDescription: {}\nWarnings: {}",
        record.symptom,
        record.remedy,
        record.description.as_deref().unwrap_or_default(),
        record.warnings.as_deref().unwrap_or_default(),
    )
}

/// Map one record to one indexable document.
#[must_use]
pub fn build_document(record: &RemedyRecord) -> IndexedDocument {
    let source = record
        .source_url
        .clone()
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

    IndexedDocument {
        text: document_text(record),
        metadata: BTreeMap::from([(SOURCE_KEY.to_string(), source)]),
    }
}
