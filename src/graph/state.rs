// Graph State
// QueryState carried through one question-answering run

use serde::Serialize;

use crate::rag::Chunk;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOutcome {
    /// A grounded answer that resolves the question.
    Answered,
    /// Regeneration limit hit without a grounded answer.
    GaveUp,
}

/// Mutable state of a single query.
///
/// `context` is replaced by grading and only appended to by the search
/// fallback; the generator always runs between the two.
#[derive(Debug, Clone)]
pub struct QueryState {
    question: String,
    pub context: Vec<Chunk>,
    /// Set by grading when any retrieved chunk was dropped.
    pub online_search: bool,
    pub answer: Option<String>,
    /// Total answer generations in this run.
    pub generations: usize,
    /// Regenerations of the current context after failed groundedness checks.
    pub hallucination_retries: usize,
    pub searches: usize,
    /// Node IDs in execution order.
    pub trace: Vec<String>,
    pub outcome: Option<QueryOutcome>,
}

impl QueryState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            context: Vec::new(),
            online_search: false,
            answer: None,
            generations: 0,
            hallucination_retries: 0,
            searches: 0,
            trace: Vec::new(),
            outcome: None,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }
}
