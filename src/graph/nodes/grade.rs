// Grade Node
// Keep relevant chunks and decide whether to search online

use async_trait::async_trait;

use super::conditions::{NEEDS_SEARCH, RELEVANT};
use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::QueryState;
use crate::rag::grade_chunks;

pub struct GradeNode;

impl GradeNode {
    pub const ID: &'static str = "grade";

    pub fn new() -> Self {
        Self
    }
}

impl Default for GradeNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for GradeNode {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn execute(
        &self,
        state: &mut QueryState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let retrieved = state.context.len();
        let outcome = grade_chunks(ctx.judge, state.question(), &state.context)
            .await
            .map_err(|e| GraphError::from_rag(self.id(), e))?;

        tracing::info!(
            "Kept {} of {} retrieved chunks",
            outcome.kept.len(),
            retrieved
        );
        state.context = outcome.kept;
        state.online_search = outcome.needs_search;

        let condition = if state.online_search {
            NEEDS_SEARCH
        } else {
            RELEVANT
        };
        Ok(NodeOutput::Branch(condition.to_string()))
    }
}
