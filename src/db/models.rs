/// A document row ready for insertion.
#[derive(Debug, Clone)]
pub struct NewDocument<'a> {
    pub content: &'a str,
    /// JSON-encoded metadata map.
    pub metadata_json: String,
}
