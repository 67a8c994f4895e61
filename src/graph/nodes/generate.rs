// Generate Node
// Produce an answer, check it, and pick the next transition

use async_trait::async_trait;

use super::conditions::{ANSWERS_QUESTION, GAVE_UP, HALLUCINATION, QUESTION_NOT_ADDRESSED};
use crate::core::errors::RagError;
use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{QueryOutcome, QueryState};

/// Transition chosen after a generation has been checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationRoute {
    /// Not grounded: generate again from the same context.
    Regenerate,
    /// Grounded and resolves the question.
    Accept,
    /// Grounded but inadequate: search online, then generate again.
    SearchThenRegenerate,
}

impl GenerationRoute {
    pub fn condition(self) -> &'static str {
        match self {
            GenerationRoute::Regenerate => HALLUCINATION,
            GenerationRoute::Accept => ANSWERS_QUESTION,
            GenerationRoute::SearchThenRegenerate => QUESTION_NOT_ADDRESSED,
        }
    }
}

/// Adequacy only matters once the answer is grounded.
pub fn route_after_generation(grounded: bool, adequate: bool) -> GenerationRoute {
    match (grounded, adequate) {
        (false, _) => GenerationRoute::Regenerate,
        (true, true) => GenerationRoute::Accept,
        (true, false) => GenerationRoute::SearchThenRegenerate,
    }
}

pub struct GenerateNode;

impl GenerateNode {
    pub const ID: &'static str = "generate";

    pub fn new() -> Self {
        Self
    }
}

impl Default for GenerateNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for GenerateNode {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn execute(
        &self,
        state: &mut QueryState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let fail = |e: RagError| GraphError::from_rag(Self::ID, e);

        let answer = ctx
            .generator
            .generate(state.question(), &state.context)
            .await
            .map_err(fail)?;
        state.generations += 1;

        let grounded = ctx
            .judge
            .is_grounded(&state.context, &answer)
            .await
            .map_err(fail)?
            .passed;
        let adequate = if grounded {
            ctx.judge
                .resolves_question(state.question(), &answer)
                .await
                .map_err(fail)?
                .passed
        } else {
            false
        };
        state.answer = Some(answer);

        let route = route_after_generation(grounded, adequate);
        tracing::info!(
            attempt = state.generations,
            grounded,
            adequate,
            "Generation routed to {:?}",
            route
        );

        match route {
            GenerationRoute::Regenerate => {
                state.hallucination_retries += 1;
                if state.hallucination_retries > ctx.max_regenerations {
                    tracing::warn!(
                        "Giving up after {} ungrounded generations",
                        state.hallucination_retries
                    );
                    state.outcome = Some(QueryOutcome::GaveUp);
                    return Ok(NodeOutput::Branch(GAVE_UP.to_string()));
                }
            }
            GenerationRoute::Accept => state.outcome = Some(QueryOutcome::Answered),
            GenerationRoute::SearchThenRegenerate => {}
        }

        Ok(NodeOutput::Branch(route.condition().to_string()))
    }
}
