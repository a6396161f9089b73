//! Document and chunk types with source tracking

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Which of the two indexed documents a piece of text came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceLabel {
    /// Academic transcript
    Transcript,
    /// Resume
    Resume,
}

impl SourceLabel {
    /// The metadata value stored under the `source` key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcript => "transcript",
            Self::Resume => "resume",
        }
    }

    /// Parse a stored metadata value
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "transcript" => Some(Self::Transcript),
            "resume" => Some(Self::Resume),
            _ => None,
        }
    }

    /// Infer the label from a source filename
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.contains("transcript") {
            Some(Self::Transcript)
        } else if lower.contains("resume") || lower.contains("cv") {
            Some(Self::Resume)
        } else {
            None
        }
    }
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loaded source document. Immutable once created; produced by the
/// PDF loader, consumed by the chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename
    pub filename: String,
    /// Extracted text
    pub text: String,
    /// Which document this is
    pub source: SourceLabel,
    /// Content hash for deduplication
    pub content_hash: String,
    /// File size in bytes
    pub file_size: u64,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a new document
    pub fn new(
        filename: String,
        text: String,
        source: SourceLabel,
        content_hash: String,
        file_size: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            text,
            source,
            content_hash,
            file_size,
            ingested_at: chrono::Utc::now(),
            metadata: HashMap::new(),
        }
    }
}

/// A chunk of text from a document, the unit of retrieval.
/// Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID, assigned at ingestion
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Text content
    pub content: String,
    /// Source tag inherited from the document
    pub source: SourceLabel,
    /// Embedding vector
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
    /// Chunk index within document
    pub chunk_index: u32,
    /// Additional metadata inherited from the document
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(document_id: Uuid, content: String, source: SourceLabel, chunk_index: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content,
            source,
            embedding: Vec::new(),
            chunk_index,
            metadata: HashMap::new(),
        }
    }

    /// Metadata map as persisted alongside the vector, `source` included
    pub fn to_vector_metadata(&self) -> HashMap<String, String> {
        let mut meta = self.metadata.clone();
        meta.insert("source".to_string(), self.source.as_str().to_string());
        meta.insert("chunk_index".to_string(), self.chunk_index.to_string());
        meta
    }
}
