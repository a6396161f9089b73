//! JSON-persisted local vector index with brute-force cosine search

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, Document, RetrievalFilter, SourceLabel};

use super::{ScoredChunk, VectorIndex};

/// On-disk index schema: the documents the chunks came from plus the
/// chunks themselves, embeddings included.
#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexState {
    documents: Vec<Document>,
    chunks: Vec<Chunk>,
}

/// Summary counts over the stored corpus
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexStats {
    pub documents: usize,
    pub chunks: usize,
    pub transcript_chunks: usize,
    pub resume_chunks: usize,
}

/// Local vector index backed by a JSON file
///
/// Embeds on insert through the configured `EmbeddingProvider` and
/// searches with a full cosine scan. The corpus is two small PDFs, so
/// a linear scan beats maintaining an ANN structure.
pub struct LocalVectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    storage_path: PathBuf,
    state: RwLock<IndexState>,
}

impl LocalVectorIndex {
    /// Open the index at the configured path, loading any persisted state
    pub fn open(config: &IndexConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let storage_path = config.storage_path.clone();

        let state = if storage_path.exists() {
            let content = std::fs::read_to_string(&storage_path)?;
            let state: IndexState = serde_json::from_str(&content)?;
            tracing::info!(
                documents = state.documents.len(),
                chunks = state.chunks.len(),
                path = %storage_path.display(),
                "Loaded vector index"
            );
            state
        } else {
            tracing::info!(path = %storage_path.display(), "Starting with an empty vector index");
            IndexState::default()
        };

        Ok(Self {
            embedder,
            storage_path,
            state: RwLock::new(state),
        })
    }

    /// Summary counts used by the ingestion run
    pub fn stats(&self) -> IndexStats {
        let state = self.state.read();
        let transcript_chunks = state
            .chunks
            .iter()
            .filter(|c| c.source == SourceLabel::Transcript)
            .count();

        IndexStats {
            documents: state.documents.len(),
            chunks: state.chunks.len(),
            transcript_chunks,
            resume_chunks: state.chunks.len() - transcript_chunks,
        }
    }

    /// Whether a document with this content hash is already indexed
    pub fn contains_hash(&self, content_hash: &str) -> bool {
        self.state
            .read()
            .documents
            .iter()
            .any(|d| d.content_hash == content_hash)
    }

    /// Register a document and its chunks, replacing any previously
    /// indexed document with the same filename. Returns the number of
    /// chunks stored.
    pub async fn replace_document(&self, document: Document, mut chunks: Vec<Chunk>) -> Result<usize> {
        self.embed_missing(&mut chunks).await?;
        let added = chunks.len();

        {
            let mut state = self.state.write();
            let stale: Vec<Uuid> = state
                .documents
                .iter()
                .filter(|d| d.filename == document.filename)
                .map(|d| d.id)
                .collect();
            if !stale.is_empty() {
                state.documents.retain(|d| d.filename != document.filename);
                state.chunks.retain(|c| !stale.contains(&c.document_id));
                tracing::info!(filename = %document.filename, "Replacing previously indexed document");
            }
            state.documents.push(document);
            state.chunks.append(&mut chunks);
            self.persist(&state)?;
        }

        Ok(added)
    }

    /// Embed every chunk that does not carry an embedding yet, in one batch
    async fn embed_missing(&self, chunks: &mut [Chunk]) -> Result<()> {
        let pending: Vec<String> = chunks
            .iter()
            .filter(|c| c.embedding.is_empty())
            .map(|c| c.content.clone())
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let embeddings = self.embedder.embed_batch(&pending).await?;
        let mut embeddings = embeddings.into_iter();
        for chunk in chunks.iter_mut() {
            if chunk.embedding.is_empty() {
                chunk.embedding = embeddings
                    .next()
                    .ok_or_else(|| Error::internal("embedding batch shorter than its input"))?;
            }
        }
        Ok(())
    }

    fn persist(&self, state: &IndexState) -> Result<()> {
        if let Some(parent) = self.storage_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.storage_path, json)?;
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for LocalVectorIndex {
    async fn add_documents(&self, mut chunks: Vec<Chunk>) -> Result<()> {
        self.embed_missing(&mut chunks).await?;
        let count = chunks.len();

        {
            let mut state = self.state.write();
            state.chunks.append(&mut chunks);
            self.persist(&state)?;
        }

        tracing::debug!(chunks = count, "Added chunks to the index");
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: RetrievalFilter,
    ) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        let mut results: Vec<ScoredChunk> = {
            let state = self.state.read();
            state
                .chunks
                .iter()
                .filter(|chunk| filter.matches(chunk.source))
                .map(|chunk| ScoredChunk {
                    similarity: cosine_similarity(&query_embedding, &chunk.embedding),
                    chunk: chunk.clone(),
                })
                .collect()
        };

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        results.truncate(top_k);

        Ok(results)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.state.read().chunks.len())
    }

    fn name(&self) -> &str {
        "local-cosine"
    }
}

/// Cosine similarity between two vectors. Zero-length or zero-norm
/// vectors score 0.0 rather than NaN.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic embedder: one dimension per keyword plus a shared
    /// bias component so no pair of texts is fully orthogonal.
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            let keywords = ["calculus", "grade", "google", "experience"];
            let mut v: Vec<f32> = keywords
                .iter()
                .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
                .collect();
            v.push(0.1);
            Ok(v)
        }

        fn dimensions(&self) -> usize {
            5
        }

        fn name(&self) -> &str {
            "keyword-test"
        }
    }

    fn test_index(dir: &tempfile::TempDir) -> LocalVectorIndex {
        let config = IndexConfig {
            storage_path: dir.path().join("index.json"),
        };
        LocalVectorIndex::open(&config, Arc::new(KeywordEmbedder)).unwrap()
    }

    fn chunk(content: &str, source: SourceLabel) -> Chunk {
        Chunk::new(Uuid::new_v4(), content.to_string(), source, 0)
    }

    #[tokio::test]
    async fn added_chunks_are_searchable_in_similarity_order() {
        let dir = tempfile::tempdir().unwrap();
        let index = test_index(&dir);

        index
            .add_documents(vec![
                chunk("Spring 2021: Calculus I, grade A", SourceLabel::Transcript),
                chunk("Software engineering experience at Google", SourceLabel::Resume),
            ])
            .await
            .unwrap();

        let results = index
            .search("What grade did he get in Calculus?", 5, RetrievalFilter::Unfiltered)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].chunk.content.contains("Calculus"));
        assert!(results[0].similarity > results[1].similarity);
    }

    #[tokio::test]
    async fn source_filter_excludes_the_other_document() {
        let dir = tempfile::tempdir().unwrap();
        let index = test_index(&dir);

        index
            .add_documents(vec![
                chunk("Spring 2021: Calculus I, grade A", SourceLabel::Transcript),
                chunk("Software engineering experience at Google", SourceLabel::Resume),
            ])
            .await
            .unwrap();

        let results = index
            .search(
                "work experience",
                5,
                RetrievalFilter::Source(SourceLabel::Transcript),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.source, SourceLabel::Transcript);
    }

    #[tokio::test]
    async fn search_on_empty_index_returns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let index = test_index(&dir);

        let results = index
            .search("anything", 5, RetrievalFilter::Unfiltered)
            .await
            .unwrap();
        assert!(results.is_empty());
        assert!(index.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn top_k_bounds_the_result_count() {
        let dir = tempfile::tempdir().unwrap();
        let index = test_index(&dir);

        index
            .add_documents(vec![
                chunk("Calculus I", SourceLabel::Transcript),
                chunk("Calculus II", SourceLabel::Transcript),
                chunk("Calculus III", SourceLabel::Transcript),
            ])
            .await
            .unwrap();

        let results = index
            .search("calculus", 2, RetrievalFilter::AnySource)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn index_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();

        {
            let index = test_index(&dir);
            index
                .add_documents(vec![
                    chunk("Spring 2021: Calculus I, grade A", SourceLabel::Transcript),
                    chunk("Software engineering experience at Google", SourceLabel::Resume),
                ])
                .await
                .unwrap();
        }

        let reopened = test_index(&dir);
        assert_eq!(reopened.len().await.unwrap(), 2);

        // stored embeddings survive the reload, only the query is re-embedded
        let results = reopened
            .search("grade in calculus", 1, RetrievalFilter::Unfiltered)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].chunk.content.contains("Calculus"));
    }

    #[tokio::test]
    async fn replace_document_drops_stale_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let index = test_index(&dir);

        let first = Document::new(
            "transcript.pdf".to_string(),
            "Spring 2021 Calculus".to_string(),
            SourceLabel::Transcript,
            "hash-one".to_string(),
            100,
        );
        index
            .replace_document(
                first.clone(),
                vec![
                    Chunk::new(first.id, "Spring 2021".to_string(), SourceLabel::Transcript, 0),
                    Chunk::new(first.id, "Calculus".to_string(), SourceLabel::Transcript, 1),
                ],
            )
            .await
            .unwrap();

        let second = Document::new(
            "transcript.pdf".to_string(),
            "Fall 2022 Algebra".to_string(),
            SourceLabel::Transcript,
            "hash-two".to_string(),
            120,
        );
        index
            .replace_document(
                second.clone(),
                vec![Chunk::new(
                    second.id,
                    "Fall 2022 Algebra".to_string(),
                    SourceLabel::Transcript,
                    0,
                )],
            )
            .await
            .unwrap();

        let stats = index.stats();
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.chunks, 1);
        assert!(index.contains_hash("hash-two"));
        assert!(!index.contains_hash("hash-one"));
    }

    #[test]
    fn cosine_similarity_guards_zero_norm() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);

        let same = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!((same - 1.0).abs() < 1e-6);
    }
}
