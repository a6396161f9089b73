//! Provider abstractions for the hosted chat, text2text, and embedding models
//!
//! Trait-based seams keep the pipeline testable against mock providers
//! while production wires in the Groq and Hugging Face clients.

pub mod embedding;
pub mod groq;
pub mod huggingface;
pub mod llm;

pub use embedding::EmbeddingProvider;
pub use groq::GroqChat;
pub use huggingface::{HfEmbedder, HfText2Text};
pub use llm::{ChatMessage, ChatProvider, ChatRole, Text2TextProvider, TokenStream};
