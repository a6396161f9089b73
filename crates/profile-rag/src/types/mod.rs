//! Core types for the RAG pipeline

pub mod chat;
pub mod classification;
pub mod document;

pub use chat::{ChatRequest, ChatResponse, HealthResponse};
pub use classification::{Classification, RetrievalFilter};
pub use document::{Chunk, Document, SourceLabel};
