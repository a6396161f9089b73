//! Prompt templates for the pipeline stages

use crate::index::ScoredChunk;
use crate::providers::ChatMessage;

/// The literal answer the model must give when the context cannot
/// answer the question. The answer stage instructs the model to emit it
/// and callers can compare against it.
pub const UNKNOWN_ANSWER: &str = "I do not know";

/// Prompt builder for the five pipeline stages
pub struct PromptBuilder;

impl PromptBuilder {
    /// Few-shot classification prompt for the text2text model. Output is
    /// expected to be a bare source label.
    pub fn classify(question: &str) -> String {
        format!(
            r#"You are a classifier that determines the source of the answer.
The sources are:
Transcript: academic performance, courses, grades.
Resume: skills, work experiences, projects.
Examples:
Question: What is his cumulative average?
Answer: transcript
Question: Tell me about his work experience at Google.
Answer: resume
Question: What courses did he take last semester?
Answer: transcript
Classify this question as 'resume', 'transcript': {question}
Answer: "#
        )
    }

    /// Chat messages for the compaction stage: a researcher persona that
    /// digests the stuffed retrieval results down to what the question needs
    pub fn compact_messages(subject: &str, question: &str, context: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(format!(
                "You are a researcher that looks for relevant data to answer the given question about {subject}."
            )),
            ChatMessage::user(format!("Here is the question: {question}")),
            ChatMessage::assistant(format!("Find the relevant data in this context: {context}")),
        ]
    }

    /// Chat messages for the answer stage, grounded in the compacted
    /// context and restricted to the subject
    pub fn answer_messages(
        subject: &str,
        context: &str,
        history: &str,
        question: &str,
    ) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(format!(
                "You are a helpful assistant that helps answer questions about {subject}."
            )),
            ChatMessage::assistant(format!(
                "You have access to the following context, which comprises the transcript and resume:\n\
                 {context}\n\
                 You can only answer questions about {subject} and their work. If you do not know the answer, say '{UNKNOWN_ANSWER}'.\n\
                 These are the previous messages in the conversation:\n\
                 {history}\n"
            )),
            ChatMessage::user(format!("What is the answer to this question?: {question}")),
        ]
    }

    /// Rephrase prompt for the text2text model: condense the draft answer
    /// into one sentence
    pub fn rephrase(question: &str, answer: &str) -> String {
        format!(
            r#"Please rephrase the following text into a concise sentence that answers the question:
Question: {question}
Text to rephrase: {answer}

Rephrased answer:"#
        )
    }

    /// Single prompt for the streaming answer flow, grounded in the raw
    /// retrieved knowledge
    pub fn stream_prompt(question: &str, history: &str, knowledge: &str) -> String {
        format!(
            r#"You are an assistant that answers questions based on knowledge which is provided to you.
While answering, you do not use your internal knowledge, but solely the information in the "The knowledge" section.
You do not mention anything to the user about the provided knowledge.

The question: {question}

Conversation history: {history}

The knowledge: {knowledge}

Answer:"#
        )
    }

    /// Stuff retrieved chunks into one context block
    pub fn build_context(results: &[ScoredChunk]) -> String {
        results
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Knowledge block for the streaming flow, one chunk per line
    pub fn build_knowledge(results: &[ScoredChunk]) -> String {
        let mut knowledge = String::new();
        for result in results {
            knowledge.push_str(&result.chunk.content);
            knowledge.push('\n');
        }
        knowledge
    }

    /// Render caller-supplied conversation turns for the history block
    pub fn format_history(history: &[(String, String)]) -> String {
        history
            .iter()
            .map(|(question, answer)| format!("Human: {question}\nAI: {answer}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ChatRole;
    use crate::types::{Chunk, SourceLabel};
    use uuid::Uuid;

    fn scored(content: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk::new(Uuid::new_v4(), content.to_string(), SourceLabel::Transcript, 0),
            similarity: 1.0,
        }
    }

    #[test]
    fn classify_prompt_carries_the_few_shot_examples() {
        let prompt = PromptBuilder::classify("What was his GPA?");
        assert!(prompt.contains("What is his cumulative average?\nAnswer: transcript"));
        assert!(prompt.contains("work experience at Google.\nAnswer: resume"));
        assert!(prompt.contains("Classify this question as 'resume', 'transcript': What was his GPA?"));
        assert!(prompt.ends_with("Answer: "));
    }

    #[test]
    fn compact_messages_follow_the_researcher_shape() {
        let messages = PromptBuilder::compact_messages("Richard Zhu", "What courses?", "Spring 2021: Calculus");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0].content.contains("researcher"));
        assert!(messages[0].content.contains("Richard Zhu"));
        assert_eq!(messages[1].role, ChatRole::User);
        assert!(messages[1].content.contains("What courses?"));
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert!(messages[2].content.contains("Spring 2021: Calculus"));
    }

    #[test]
    fn answer_messages_carry_the_unknown_sentinel() {
        let messages =
            PromptBuilder::answer_messages("Richard Zhu", "some context", "", "What grade?");
        let context_block = &messages[1].content;
        assert!(context_block.contains("some context"));
        assert!(context_block.contains("say 'I do not know'"));
        assert_eq!(
            messages[2].content,
            "What is the answer to this question?: What grade?"
        );
    }

    #[test]
    fn rephrase_prompt_names_question_and_draft() {
        let prompt = PromptBuilder::rephrase("What grade?", "He received an A in Calculus I.");
        assert!(prompt.contains("Question: What grade?"));
        assert!(prompt.contains("Text to rephrase: He received an A in Calculus I."));
        assert!(prompt.ends_with("Rephrased answer:"));
    }

    #[test]
    fn context_stuffs_all_chunks() {
        let results = vec![scored("first chunk"), scored("second chunk")];
        assert_eq!(
            PromptBuilder::build_context(&results),
            "first chunk\n\nsecond chunk"
        );
    }

    #[test]
    fn knowledge_lists_one_chunk_per_line() {
        let results = vec![scored("alpha"), scored("beta")];
        assert_eq!(PromptBuilder::build_knowledge(&results), "alpha\nbeta\n");
    }

    #[test]
    fn history_renders_turn_pairs() {
        let history = vec![("Who is he?".to_string(), "A student.".to_string())];
        assert_eq!(
            PromptBuilder::format_history(&history),
            "Human: Who is he?\nAI: A student."
        );
        assert_eq!(PromptBuilder::format_history(&[]), "");
    }

    #[test]
    fn stream_prompt_embeds_the_knowledge_block() {
        let prompt = PromptBuilder::stream_prompt("What grade?", "", "Calculus I: A\n");
        assert!(prompt.contains("The question: What grade?"));
        assert!(prompt.contains("The knowledge: Calculus I: A"));
        assert!(prompt.ends_with("Answer:"));
    }
}
