//! Linear question-answering pipeline

use std::sync::Arc;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::index::{ScoredChunk, VectorIndex};
use crate::pipeline::prompt::PromptBuilder;
use crate::providers::{ChatMessage, ChatProvider, Text2TextProvider, TokenStream};
use crate::types::{Classification, RetrievalFilter};

/// The five-stage answering pipeline: classify, retrieve, compact,
/// answer, rephrase. Stages always run in that order and each consumes
/// the previous stage's output.
pub struct RagPipeline {
    /// Person the indexed documents describe
    subject: String,
    /// Chunks retrieved per question
    top_k: usize,
    /// Chat model for compaction and answering
    chat: Arc<dyn ChatProvider>,
    /// Text2text model for classification and rephrasing
    text2text: Arc<dyn Text2TextProvider>,
    /// Chunk index
    index: Arc<dyn VectorIndex>,
}

impl RagPipeline {
    /// Create a pipeline over the given providers
    pub fn new(
        config: &PipelineConfig,
        chat: Arc<dyn ChatProvider>,
        text2text: Arc<dyn Text2TextProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            subject: config.subject.clone(),
            top_k: config.top_k,
            chat,
            text2text,
            index,
        }
    }

    /// Run the full pipeline for one question. `history` carries prior
    /// (question, answer) turns and may be empty.
    pub async fn answer_question(
        &self,
        question: &str,
        history: &[(String, String)],
    ) -> Result<String> {
        let start = Instant::now();

        tracing::info!("Question: \"{}\"", question);

        // Classify the question to pick a source filter
        let classification = self.classify(question).await?;

        // Retrieve the chunks that pass the filter
        let results = self.retrieve(question, classification).await?;
        tracing::info!(
            "Classified as '{}', retrieved {} chunks",
            classification.as_str(),
            results.len()
        );

        // Compact the retrieved chunks down to what the question needs
        let context = self.compact(question, &results).await?;
        tracing::debug!("Compacted context: {} chars", context.len());

        // Draft an answer grounded in the compacted context
        let history_text = PromptBuilder::format_history(history);
        let draft = self.answer(question, &context, &history_text).await?;
        tracing::debug!("Draft answer: {} chars", draft.len());

        // Rephrase the draft into one concise sentence
        let answer = self.rephrase(question, &draft).await?;

        tracing::info!(
            "Answer pipeline completed in {}ms",
            start.elapsed().as_millis()
        );

        Ok(answer)
    }

    /// Streaming variant: retrieve without a source filter, then stream
    /// the answer tokens straight from the chat model
    pub async fn answer_stream(
        &self,
        question: &str,
        history: &[(String, String)],
    ) -> Result<TokenStream> {
        tracing::info!("Streaming question: \"{}\"", question);

        let results = self
            .index
            .search(question, self.top_k, RetrievalFilter::Unfiltered)
            .await?;
        tracing::debug!("Retrieved {} chunks for streaming answer", results.len());

        let knowledge = PromptBuilder::build_knowledge(&results);
        let history_text = PromptBuilder::format_history(history);
        let prompt = PromptBuilder::stream_prompt(question, &history_text, &knowledge);

        self.chat
            .complete_stream(&[ChatMessage::user(prompt)])
            .await
    }

    /// Classify which document should answer the question. Output the
    /// parser does not recognize becomes `Unknown`.
    pub async fn classify(&self, question: &str) -> Result<Classification> {
        let raw = self.text2text.generate(&PromptBuilder::classify(question)).await?;
        let classification = Classification::parse(&raw);

        if classification == Classification::Unknown {
            tracing::warn!(
                "Classifier output '{}' matched no label, searching unfiltered",
                raw.trim()
            );
        }

        Ok(classification)
    }

    /// Search the index with the filter the classification implies
    pub async fn retrieve(
        &self,
        question: &str,
        classification: Classification,
    ) -> Result<Vec<ScoredChunk>> {
        let filter = RetrievalFilter::from_classification(classification);
        self.index.search(question, self.top_k, filter).await
    }

    /// Boil the retrieved chunks down to the data relevant to the question
    pub async fn compact(&self, question: &str, results: &[ScoredChunk]) -> Result<String> {
        let context = PromptBuilder::build_context(results);
        let messages = PromptBuilder::compact_messages(&self.subject, question, &context);
        self.chat.complete(&messages).await
    }

    /// Draft an answer from the compacted context
    pub async fn answer(&self, question: &str, context: &str, history: &str) -> Result<String> {
        let messages = PromptBuilder::answer_messages(&self.subject, context, history, question);
        self.chat.complete(&messages).await
    }

    /// Condense the draft answer into one sentence
    pub async fn rephrase(&self, question: &str, draft: &str) -> Result<String> {
        self.text2text
            .generate(&PromptBuilder::rephrase(question, draft))
            .await
    }
}
