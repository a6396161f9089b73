//! Configuration for the RAG pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RagConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Groq chat-completion configuration
    #[serde(default)]
    pub groq: GroqConfig,
    /// Hugging Face Inference API configuration
    #[serde(default)]
    pub huggingface: HuggingFaceConfig,
    /// Vector index configuration
    #[serde(default)]
    pub index: IndexConfig,
    /// Ingestion configuration
    #[serde(default)]
    pub ingestion: IngestionConfig,
}

impl RagConfig {
    /// Parse configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content)
            .map_err(|e| Error::config(format!("{}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from `PROFILE_RAG_CONFIG` or `./profile-rag.toml`,
    /// falling back to defaults when neither exists
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("PROFILE_RAG_CONFIG") {
            return Self::from_file(path);
        }
        let default_path = PathBuf::from("profile-rag.toml");
        if default_path.exists() {
            return Self::from_file(default_path);
        }
        Ok(Self::default())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_body_size: 64 * 1024, // questions are small
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// The person the indexed documents describe
    pub subject: String,
    /// Number of chunks to retrieve per query
    pub top_k: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            subject: "Richard Zhu".to_string(),
            top_k: 5,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Overlap used by the generic ingestion split
    #[serde(default = "default_ingest_overlap")]
    pub ingest_overlap: usize,
    /// Separators prioritized when splitting a transcript
    #[serde(default = "default_transcript_separators")]
    pub transcript_separators: Vec<String>,
    /// Separators prioritized when splitting a resume
    #[serde(default = "default_resume_separators")]
    pub resume_separators: Vec<String>,
}

fn default_chunk_size() -> usize {
    300
}

fn default_chunk_overlap() -> usize {
    20
}

fn default_ingest_overlap() -> usize {
    100
}

fn default_transcript_separators() -> Vec<String> {
    // Academic term markers
    vec!["Spring".into(), "Winter".into(), "Fall".into()]
}

fn default_resume_separators() -> Vec<String> {
    // Section headers
    vec![
        "Technical Skills".into(),
        "Experience".into(),
        "Projects".into(),
        "Education".into(),
    ]
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            ingest_overlap: default_ingest_overlap(),
            transcript_separators: default_transcript_separators(),
            resume_separators: default_resume_separators(),
        }
    }
}

/// Groq chat-completion configuration (OpenAI-compatible API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    /// API base URL
    pub base_url: String,
    /// Chat model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.8,
            timeout_secs: 60,
            max_retries: 3,
            api_key_env: "GROQ_API_KEY".to_string(),
        }
    }
}

/// Hugging Face Inference API configuration, used for the text2text
/// classifier/rephrase model and for embeddings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceConfig {
    /// API base URL
    pub base_url: String,
    /// Text2text model for classification and rephrasing
    pub text2text_model: String,
    /// Embedding model
    pub embedding_model: String,
    /// Embedding dimensions
    pub embedding_dimensions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Environment variable holding the API token
    pub api_key_env: String,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co".to_string(),
            text2text_model: "google/flan-t5-base".to_string(),
            embedding_model: "jinaai/jina-embeddings-v2-base-en".to_string(),
            embedding_dimensions: 768,
            timeout_secs: 60,
            max_retries: 3,
            api_key_env: "HF_API_TOKEN".to_string(),
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Storage path for the persisted index
    pub storage_path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        let storage_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("profile-rag")
            .join("index.json");

        Self { storage_path }
    }
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Directory of source PDFs
    pub data_dir: PathBuf,
    /// Timeout for extracting text from a single PDF in seconds
    pub parse_timeout_secs: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            parse_timeout_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_constants() {
        let config = RagConfig::default();
        assert_eq!(config.pipeline.top_k, 5);
        assert_eq!(config.chunking.chunk_size, 300);
        assert_eq!(config.chunking.chunk_overlap, 20);
        assert_eq!(config.chunking.ingest_overlap, 100);
        assert_eq!(config.groq.model, "llama-3.3-70b-versatile");
        assert_eq!(config.huggingface.text2text_model, "google/flan-t5-base");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: RagConfig = toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000
            enable_cors = false
            max_body_size = 1024

            [chunking]
            chunk_size = 500
            "#,
        )
        .unwrap();

        assert_eq!(parsed.server.port, 9000);
        assert_eq!(parsed.chunking.chunk_size, 500);
        // untouched sections and fields keep their defaults
        assert_eq!(parsed.chunking.chunk_overlap, 20);
        assert_eq!(parsed.pipeline.subject, "Richard Zhu");
        assert_eq!(parsed.groq.temperature, 0.8);
    }

    #[test]
    fn separator_defaults_cover_both_document_types() {
        let chunking = ChunkingConfig::default();
        assert_eq!(chunking.transcript_separators, vec!["Spring", "Winter", "Fall"]);
        assert!(chunking.resume_separators.contains(&"Experience".to_string()));
    }
}
