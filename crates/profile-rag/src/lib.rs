//! profile-rag: RAG chat backend answering questions about one person
//!
//! This crate ingests a transcript and a resume PDF into a local vector
//! index and answers questions through a five-stage pipeline: classify the
//! question, retrieve source-filtered chunks, compact them, draft an
//! answer, and rephrase it into one sentence.

pub mod config;
pub mod error;
pub mod index;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use index::{LocalVectorIndex, ScoredChunk, VectorIndex};
pub use pipeline::{RagPipeline, UNKNOWN_ANSWER};
pub use types::{
    chat::{ChatRequest, ChatResponse},
    classification::{Classification, RetrievalFilter},
    document::{Chunk, Document, SourceLabel},
};
