//! Application state for the chat server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::index::{LocalVectorIndex, VectorIndex};
use crate::pipeline::RagPipeline;
use crate::providers::{GroqChat, HfEmbedder, HfText2Text};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// The answering pipeline
    pipeline: RagPipeline,
    /// Chunk index, shared with the pipeline
    index: Arc<dyn VectorIndex>,
}

impl AppState {
    /// Build the real providers and assemble the application state
    pub async fn initialize(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing chat backend...");

        let chat = Arc::new(GroqChat::from_config(&config.groq)?);
        tracing::info!("Chat provider initialized ({})", config.groq.model);

        let text2text = Arc::new(HfText2Text::from_config(&config.huggingface)?);
        tracing::info!(
            "Text2text provider initialized ({})",
            config.huggingface.text2text_model
        );

        let embedder = Arc::new(HfEmbedder::from_config(&config.huggingface)?);
        let index: Arc<dyn VectorIndex> =
            Arc::new(LocalVectorIndex::open(&config.index, embedder)?);

        let chunks = index.len().await?;
        if chunks == 0 {
            tracing::warn!(
                "Index at {} is empty, run the ingest binary first",
                config.index.storage_path.display()
            );
        } else {
            tracing::info!("Index loaded with {} chunks", chunks);
        }

        let pipeline = RagPipeline::new(&config.pipeline, chat, text2text, Arc::clone(&index));

        Ok(Self::from_parts(config, pipeline, index))
    }

    /// Assemble state from prebuilt parts
    pub fn from_parts(
        config: RagConfig,
        pipeline: RagPipeline,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                index,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the answering pipeline
    pub fn pipeline(&self) -> &RagPipeline {
        &self.inner.pipeline
    }

    /// Get the chunk index
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.inner.index
    }
}
