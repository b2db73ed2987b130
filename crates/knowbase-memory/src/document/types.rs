#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Canonical path the document was read from.
    pub source: String,
    /// Name the file was uploaded under.
    pub file_name: String,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub content: String,
    pub metadata: DocumentMetadata,
    pub chunk_index: usize,
}
