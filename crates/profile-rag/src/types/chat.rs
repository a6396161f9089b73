//! Wire types for the chat endpoint

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/chat/`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatRequest {
    /// The question to answer
    #[serde(default)]
    pub question: Option<String>,
}

impl ChatRequest {
    /// The question, if one was actually provided
    pub fn question(&self) -> Option<&str> {
        self.question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// Success body for `POST /api/chat/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The final rephrased answer
    pub answer: String,
}

/// Body for `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
    /// Number of chunks currently indexed
    pub chunks: usize,
}
