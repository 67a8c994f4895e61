// Search Online Node
// Append web search results to the context as one chunk

use async_trait::async_trait;

use crate::core::errors::RagError;
use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::QueryState;
use crate::tools::results_to_chunk;

pub struct SearchOnlineNode;

impl SearchOnlineNode {
    pub const ID: &'static str = "search_online";

    pub fn new() -> Self {
        Self
    }
}

impl Default for SearchOnlineNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for SearchOnlineNode {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn execute(
        &self,
        state: &mut QueryState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let results = ctx
            .search
            .search(state.question(), ctx.search_max_results)
            .await
            .map_err(|e| GraphError::from_rag(self.id(), RagError::Search(e.to_string())))?;

        if results.is_empty() {
            tracing::warn!(provider = ctx.search.name(), "Web search returned no results");
        } else {
            tracing::info!(
                provider = ctx.search.name(),
                "Web search returned {} results",
                results.len()
            );
        }

        state.context.push(results_to_chunk(&results));
        state.searches += 1;
        // New context, fresh regeneration budget.
        state.hallucination_retries = 0;
        Ok(NodeOutput::Continue)
    }
}
