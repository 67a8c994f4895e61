use super::chunk::Chunk;
use super::judge::Judge;
use crate::core::errors::RagError;

/// Relevant chunks, in their original order, and whether any were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeOutcome {
    pub kept: Vec<Chunk>,
    pub needs_search: bool,
}

/// Grade every chunk against `question`. The first classifier failure aborts.
pub async fn grade_chunks(
    judge: &dyn Judge,
    question: &str,
    chunks: &[Chunk],
) -> Result<GradeOutcome, RagError> {
    let mut kept = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let verdict = judge.grade_chunk(question, chunk).await?;
        if verdict.passed {
            kept.push(chunk.clone());
        } else {
            tracing::debug!(source = ?chunk.source(), "Dropped irrelevant chunk");
        }
    }

    let needs_search = kept.len() < chunks.len();
    Ok(GradeOutcome { kept, needs_search })
}
