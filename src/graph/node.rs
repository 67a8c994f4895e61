// Node trait and types
// Base abstraction for graph nodes

use async_trait::async_trait;

use crate::core::errors::{ApiError, RagError};
use crate::rag::{AnswerGenerator, Judge, Retriever};
use crate::tools::WebSearch;

use super::state::QueryState;

/// Collaborators and limits a node may use. Built per query.
pub struct NodeContext<'a> {
    /// Nearest-chunk lookup bound to the session's index
    pub retriever: &'a Retriever,
    /// Relevance / groundedness / adequacy classifiers
    pub judge: &'a dyn Judge,
    pub generator: &'a dyn AnswerGenerator,
    pub search: &'a dyn WebSearch,
    /// Results folded into the fallback chunk
    pub search_max_results: usize,
    /// Regenerations allowed for one context before giving up
    pub max_regenerations: usize,
}

/// Output from a node execution
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutput {
    /// Follow the node's unconditional outgoing edge
    Continue,
    /// Follow the outgoing edge labelled with this condition
    Branch(String),
    /// Graph execution complete
    Final,
}

/// Graph execution error
///
/// `execution_trace` records the node IDs visited before the failure, most
/// recent last. `cause` keeps the pipeline error a node failed with.
#[derive(Debug)]
pub struct GraphError {
    pub node_id: String,
    pub message: String,
    pub execution_trace: Vec<String>,
    pub cause: Option<Box<RagError>>,
}

impl GraphError {
    pub fn new(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            message: message.into(),
            execution_trace: Vec::new(),
            cause: None,
        }
    }

    /// Wrap a pipeline failure raised inside `node_id`.
    pub fn from_rag(node_id: impl Into<String>, err: RagError) -> Self {
        Self {
            node_id: node_id.into(),
            message: err.to_string(),
            execution_trace: Vec::new(),
            cause: Some(Box::new(err)),
        }
    }

    pub fn with_trace(mut self, trace: Vec<String>) -> Self {
        self.execution_trace = trace;
        self
    }
}

impl From<GraphError> for RagError {
    fn from(err: GraphError) -> Self {
        match err.cause {
            Some(cause) => {
                tracing::warn!(
                    node = %err.node_id,
                    trace = %err.execution_trace.join(" -> "),
                    "Graph node failed: {}",
                    err.message
                );
                *cause
            }
            None => RagError::Graph(err),
        }
    }
}

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        RagError::from(err).into()
    }
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.execution_trace.is_empty() {
            write!(f, "GraphError in {}: {}", self.node_id, self.message)
        } else {
            write!(
                f,
                "GraphError in {} (trace: {}): {}",
                self.node_id,
                self.execution_trace.join(" -> "),
                self.message
            )
        }
    }
}

impl std::error::Error for GraphError {}

/// Node trait - all graph nodes implement this
#[async_trait]
pub trait Node: Send + Sync {
    /// Unique identifier for this node
    fn id(&self) -> &'static str;

    async fn execute(
        &self,
        state: &mut QueryState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_failures_surface_their_pipeline_error() {
        let err = GraphError::from_rag("search_online", RagError::Search("timeout".to_string()))
            .with_trace(vec!["retrieve".to_string(), "grade".to_string()]);

        assert!(matches!(RagError::from(err), RagError::Search(msg) if msg == "timeout"));
    }

    #[test]
    fn runtime_failures_stay_graph_errors() {
        let err = GraphError::new("runtime", "Maximum steps (25) exceeded");
        assert!(matches!(RagError::from(err), RagError::Graph(_)));
    }

    #[test]
    fn display_includes_trace() {
        let err = GraphError::new("generate", "boom")
            .with_trace(vec!["retrieve".to_string(), "generate".to_string()]);
        assert_eq!(
            err.to_string(),
            "GraphError in generate (trace: retrieve -> generate): boom"
        );
    }
}
