//! System prompts for the answer generator and the yes/no graders.

use super::chunk::Chunk;

pub const GENERATE_SYSTEM: &str = "You answer questions using only the supplied context. \
If the context does not contain the answer, say that you don't know. \
Keep the answer to three sentences at most.";

pub const RELEVANCE_SYSTEM: &str = "You judge whether a retrieved document is relevant \
to a user question. It is relevant if it contains keywords or meaning that help answer \
the question; the test does not need to be strict. \
Reply with binary_score 'yes' if it is relevant and 'no' if it is not.";

pub const GROUNDED_SYSTEM: &str = "You judge whether an answer is grounded in a set of facts. \
Reply with binary_score 'yes' if every claim in the answer is supported by the facts, \
otherwise 'no'.";

pub const ADEQUACY_SYSTEM: &str = "You judge whether an answer resolves a question. \
Reply with binary_score 'yes' if it does, otherwise 'no'.";

/// Context chunks separated by blank lines, in order.
pub fn format_context(context: &[Chunk]) -> String {
    context
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn generate_user(question: &str, context: &[Chunk]) -> String {
    format!(
        "Question: {}\n\nContext:\n{}\n\nAnswer:",
        question,
        format_context(context)
    )
}

pub fn relevance_user(question: &str, chunk: &Chunk) -> String {
    format!(
        "Retrieved document:\n\n{}\n\nUser question: {}",
        chunk.content, question
    )
}

pub fn grounded_user(context: &[Chunk], answer: &str) -> String {
    format!(
        "Set of facts:\n\n{}\n\nAnswer: {}",
        format_context(context),
        answer
    )
}

pub fn adequacy_user(question: &str, answer: &str) -> String {
    format!("User question:\n\n{}\n\nAnswer: {}", question, answer)
}
