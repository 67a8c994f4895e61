// Retrieve Node
// Fetch the nearest chunks of the session index

use async_trait::async_trait;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::QueryState;

pub struct RetrieveNode;

impl RetrieveNode {
    pub const ID: &'static str = "retrieve";

    pub fn new() -> Self {
        Self
    }
}

impl Default for RetrieveNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for RetrieveNode {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn execute(
        &self,
        state: &mut QueryState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let chunks = ctx
            .retriever
            .retrieve(state.question())
            .await
            .map_err(|e| GraphError::from_rag(self.id(), e))?;

        tracing::info!(
            collection = ctx.retriever.collection(),
            "Retrieved {} chunks",
            chunks.len()
        );
        state.context = chunks;
        Ok(NodeOutput::Continue)
    }
}
