//! Vector index adapter: chunk storage with similarity search
//!
//! The pipeline talks to the index through the `VectorIndex` trait;
//! `LocalVectorIndex` is the JSON-persisted cosine-scan implementation.

pub mod store;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Chunk, RetrievalFilter};

pub use store::LocalVectorIndex;

/// A chunk returned from a search, with its similarity to the query
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The matching chunk
    pub chunk: Chunk,
    /// Cosine similarity score (higher is better)
    pub similarity: f32,
}

/// Trait for vector index backends
///
/// Embedding happens behind this trait: callers hand over raw text for
/// both insertion and search, and the backend owns the embedding calls.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Embed and store a batch of chunks. Chunk ids are assigned by the
    /// caller at ingestion and preserved by the index.
    async fn add_documents(&self, chunks: Vec<Chunk>) -> Result<()>;

    /// Find the `top_k` chunks most similar to the query text, restricted
    /// to chunks whose `source` passes the filter. Results are ordered by
    /// descending similarity.
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: RetrievalFilter,
    ) -> Result<Vec<ScoredChunk>>;

    /// Number of stored chunks
    async fn len(&self) -> Result<usize>;

    /// Check if the index has no chunks
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get backend name for logging
    fn name(&self) -> &str;
}
