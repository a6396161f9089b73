//! Ingestion pipeline: PDF directory to labeled chunks

use std::path::Path;
use walkdir::WalkDir;

use crate::config::{ChunkingConfig, IngestionConfig};
use crate::error::{Error, Result};
use crate::types::{Chunk, Document, SourceLabel};

use super::chunker::TextChunker;
use super::parser::PdfParser;

/// Main ingestion pipeline
pub struct IngestPipeline {
    /// PDF parser
    parser: PdfParser,
    /// Chunker for the labeled per-type split
    chunker: TextChunker,
    /// Chunker for the coarse generic split
    generic_chunker: TextChunker,
    /// Chunking configuration (separator lists)
    chunking: ChunkingConfig,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(chunking: &ChunkingConfig, ingestion: &IngestionConfig) -> Self {
        Self {
            parser: PdfParser::new(ingestion.parse_timeout_secs),
            chunker: TextChunker::new(chunking.chunk_size, chunking.chunk_overlap),
            generic_chunker: TextChunker::new(chunking.chunk_size, chunking.ingest_overlap),
            chunking: chunking.clone(),
        }
    }

    /// Parse one PDF into a labeled document. The label comes from the
    /// filename since the index only ever holds the two known documents.
    pub fn load_file(&self, path: &Path) -> Result<Document> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let source = SourceLabel::from_filename(&filename).ok_or_else(|| {
            Error::file_parse(
                &filename,
                "Cannot tell whether this file is the transcript or the resume",
            )
        })?;

        let data = std::fs::read(path)?;
        let parsed = self.parser.parse(&filename, &data)?;

        Ok(Document::new(
            filename,
            parsed.text,
            source,
            parsed.content_hash,
            data.len() as u64,
        ))
    }

    /// Chunk a document with the separator list for its source type
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        let separators = match doc.source {
            SourceLabel::Transcript => &self.chunking.transcript_separators,
            SourceLabel::Resume => &self.chunking.resume_separators,
        };
        self.chunker.chunk_document(doc, doc.source, Some(separators))
    }

    /// Chunk a document with the coarse generic split, ignoring the
    /// per-type separator lists
    pub fn chunk_generic(&self, doc: &Document) -> Vec<Chunk> {
        self.generic_chunker.chunk_document(doc, doc.source, None)
    }

    /// Full ingestion of one file: parse + chunk
    pub fn ingest_file(&self, path: &Path) -> Result<(Document, Vec<Chunk>)> {
        let doc = self.load_file(path)?;
        let chunks = self.chunk_document(&doc);
        Ok((doc, chunks))
    }

    /// Ingest every PDF under a directory. Files whose label cannot be
    /// inferred are skipped with a warning rather than failing the run.
    pub fn ingest_dir(&self, dir: &Path) -> Result<Vec<(Document, Vec<Chunk>)>> {
        if !dir.exists() {
            return Err(Error::config(format!(
                "Data directory does not exist: {}",
                dir.display()
            )));
        }

        let mut results = Vec::new();

        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_pdf = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false);
            if !is_pdf {
                continue;
            }

            match self.ingest_file(path) {
                Ok((doc, chunks)) => {
                    tracing::info!(
                        "Ingested {} as {} ({} chunks)",
                        doc.filename,
                        doc.source,
                        chunks.len()
                    );
                    results.push((doc, chunks));
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                }
            }
        }

        Ok(results)
    }
}
