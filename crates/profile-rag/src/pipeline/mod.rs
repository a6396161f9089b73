//! Question-answering pipeline
//!
//! A question moves through five stages in a fixed order:
//!
//! 1. Classify: a text2text model labels the question `transcript`,
//!    `resume`, or `both`
//! 2. Retrieve: the index is searched with the source filter the label
//!    implies
//! 3. Compact: a chat model boils the retrieved chunks down to the data
//!    relevant to the question
//! 4. Answer: a chat model drafts an answer grounded in the compacted
//!    context
//! 5. Rephrase: the text2text model condenses the draft into one sentence

pub mod chain;
pub mod prompt;

pub use chain::RagPipeline;
pub use prompt::{PromptBuilder, UNKNOWN_ANSWER};
