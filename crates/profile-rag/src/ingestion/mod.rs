//! Document ingestion: PDF parsing and chunking

pub mod chunker;
pub mod loader;
pub mod parser;

pub use chunker::TextChunker;
pub use loader::IngestPipeline;
pub use parser::{ParsedPdf, PdfParser};
