// Graph Runtime - petgraph based
// StateGraph execution engine with the edge table held as data

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use super::node::{GraphError, Node, NodeContext, NodeOutput};
use super::state::QueryState;

/// Terminal pseudo-node. Following an edge into it ends the run.
pub const END: &str = "__end__";

/// Edge condition for graph routing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeCondition {
    /// Always follow this edge (default edge)
    Always,
    /// Follow this edge when the node returns this condition
    OnCondition(String),
}

impl EdgeCondition {
    pub fn always() -> Self {
        Self::Always
    }

    pub fn on(condition: impl Into<String>) -> Self {
        Self::OnCondition(condition.into())
    }

    pub fn matches(&self, condition: Option<&str>) -> bool {
        match (self, condition) {
            (EdgeCondition::Always, None) => true,
            (EdgeCondition::OnCondition(expected), Some(actual)) => expected == actual,
            _ => false,
        }
    }
}

impl fmt::Display for EdgeCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeCondition::Always => write!(f, "always"),
            EdgeCondition::OnCondition(c) => write!(f, "{}", c),
        }
    }
}

/// One row of the transition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: String,
    pub condition: EdgeCondition,
    pub to: String,
}

struct EndNode;

#[async_trait]
impl Node for EndNode {
    fn id(&self) -> &'static str {
        END
    }

    async fn execute(
        &self,
        _state: &mut QueryState,
        _ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        Ok(NodeOutput::Final)
    }
}

/// petgraph-based StateGraph runtime
pub struct GraphRuntime {
    /// The underlying directed graph
    graph: DiGraph<Box<dyn Node>, EdgeCondition>,
    /// Map from node ID to NodeIndex for lookup
    node_indices: HashMap<String, NodeIndex>,
    end_idx: NodeIndex,
    /// Entry point node ID
    entry_node_id: String,
    /// Maximum execution steps (recursion limit)
    max_steps: usize,
    /// Upper bound on a single node execution
    node_timeout: Duration,
}

impl GraphRuntime {
    pub fn new() -> Self {
        let mut graph: DiGraph<Box<dyn Node>, EdgeCondition> = DiGraph::new();
        let end_idx = graph.add_node(Box::new(EndNode));
        let mut node_indices = HashMap::new();
        node_indices.insert(END.to_string(), end_idx);

        Self {
            graph,
            node_indices,
            end_idx,
            entry_node_id: String::new(),
            max_steps: 25,
            node_timeout: Duration::from_secs(120),
        }
    }

    pub fn add_node(&mut self, node: Box<dyn Node>) -> NodeIndex {
        let id = node.id().to_string();
        let index = self.graph.add_node(node);
        self.node_indices.insert(id, index);
        index
    }

    pub fn add_conditional_edge(
        &mut self,
        from: &str,
        to: &str,
        condition: EdgeCondition,
    ) -> Result<(), GraphError> {
        let from_idx = self
            .node_indices
            .get(from)
            .ok_or_else(|| GraphError::new(from, format!("Source node not found: {}", from)))?;
        let to_idx = self
            .node_indices
            .get(to)
            .ok_or_else(|| GraphError::new(to, format!("Target node not found: {}", to)))?;

        let duplicate = self
            .graph
            .edges_directed(*from_idx, Direction::Outgoing)
            .any(|edge| *edge.weight() == condition);
        if duplicate {
            return Err(GraphError::new(
                from,
                format!("Duplicate edge '{}' from node: {}", condition, from),
            ));
        }

        self.graph.add_edge(*from_idx, *to_idx, condition);
        Ok(())
    }

    /// Lookup by ID; used by callers inspecting a built graph.
    pub fn get_node(&self, node_id: &str) -> Option<&dyn Node> {
        self.node_indices
            .get(node_id)
            .and_then(|idx| self.graph.node_weight(*idx))
            .map(|boxed| boxed.as_ref())
    }

    /// All node IDs except the terminal pseudo-node.
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .node_indices
            .keys()
            .map(|s| s.as_str())
            .filter(|id| *id != END)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// The transition table, in insertion order.
    pub fn edges(&self) -> Vec<Transition> {
        self.graph
            .edge_indices()
            .filter_map(|edge| {
                let (from, to) = self.graph.edge_endpoints(edge)?;
                Some(Transition {
                    from: self.graph[from].id().to_string(),
                    condition: self.graph[edge].clone(),
                    to: self.graph[to].id().to_string(),
                })
            })
            .collect()
    }

    /// Whether the transition table contains a loop (the regeneration and
    /// search cycles make this true for the question-answering graph).
    pub fn has_cycle(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Execute the graph from the entry node until an edge reaches `END`.
    pub async fn run(
        &self,
        state: &mut QueryState,
        ctx: &NodeContext<'_>,
    ) -> Result<(), GraphError> {
        if self.entry_node_id.is_empty() {
            return Err(GraphError::new("runtime", "No entry node set"));
        }

        let mut current_idx = *self.node_indices.get(&self.entry_node_id).ok_or_else(|| {
            GraphError::new(
                "runtime",
                format!("Entry node not found: {}", self.entry_node_id),
            )
        })?;

        let mut step = 0;

        loop {
            if current_idx == self.end_idx {
                tracing::debug!("Graph execution complete after {} steps", step);
                return Ok(());
            }

            if step >= self.max_steps {
                return Err(GraphError::new(
                    "runtime",
                    format!("Maximum steps ({}) exceeded", self.max_steps),
                )
                .with_trace(state.trace.clone()));
            }

            let node = self
                .graph
                .node_weight(current_idx)
                .ok_or_else(|| GraphError::new("runtime", "Node not found in graph"))?;

            let node_id = node.id();
            tracing::debug!("Executing node: {} (step {})", node_id, step);
            state.trace.push(node_id.to_string());

            let result = tokio::time::timeout(self.node_timeout, node.execute(state, ctx)).await;
            let output = match result {
                Ok(Ok(output)) => output,
                Ok(Err(err)) => return Err(err.with_trace(state.trace.clone())),
                Err(_) => {
                    return Err(GraphError::new(
                        node_id,
                        format!("Node timed out after {:?}", self.node_timeout),
                    )
                    .with_trace(state.trace.clone()))
                }
            };

            current_idx = match output {
                NodeOutput::Final => {
                    tracing::debug!("Graph execution complete at node: {}", node_id);
                    return Ok(());
                }
                NodeOutput::Continue => self.resolve_next_node(current_idx, None)?,
                NodeOutput::Branch(condition) => {
                    let next = self.resolve_next_node(current_idx, Some(&condition))?;
                    tracing::info!(
                        "Route {} --{}--> {}",
                        node_id,
                        condition,
                        self.graph[next].id()
                    );
                    next
                }
            };

            step += 1;
        }
    }

    /// Resolve the next node based on edges
    fn resolve_next_node(
        &self,
        current_idx: NodeIndex,
        condition: Option<&str>,
    ) -> Result<NodeIndex, GraphError> {
        let current_id = self
            .graph
            .node_weight(current_idx)
            .map(|n| n.id())
            .unwrap_or("unknown");

        let outgoing: Vec<(NodeIndex, &EdgeCondition)> = self
            .graph
            .edges_directed(current_idx, Direction::Outgoing)
            .map(|edge| (edge.target(), edge.weight()))
            .collect();

        if outgoing.is_empty() {
            return Err(GraphError::new(
                current_id,
                format!("No outgoing edges from node: {}", current_id),
            ));
        }

        outgoing
            .iter()
            .find(|(_, weight)| weight.matches(condition))
            .map(|(target, _)| *target)
            .ok_or_else(|| {
                GraphError::new(
                    current_id,
                    format!(
                        "No matching edge for condition: {:?}",
                        condition.unwrap_or("(none)")
                    ),
                )
            })
    }
}

impl Default for GraphRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing graphs fluently
pub struct GraphBuilder {
    runtime: GraphRuntime,
    pending_edges: Vec<(String, String, EdgeCondition)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            runtime: GraphRuntime::new(),
            pending_edges: Vec::new(),
        }
    }

    pub fn entry(mut self, node_id: impl Into<String>) -> Self {
        self.runtime.entry_node_id = node_id.into();
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.runtime.max_steps = max_steps;
        self
    }

    pub fn node_timeout(mut self, timeout: Duration) -> Self {
        self.runtime.node_timeout = timeout;
        self
    }

    pub fn node(mut self, node: Box<dyn Node>) -> Self {
        self.runtime.add_node(node);
        self
    }

    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.pending_edges
            .push((from.into(), to.into(), EdgeCondition::Always));
        self
    }

    pub fn conditional_edge(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        self.pending_edges
            .push((from.into(), to.into(), EdgeCondition::on(condition)));
        self
    }

    pub fn build(mut self) -> Result<GraphRuntime, GraphError> {
        for (from, to, condition) in self.pending_edges {
            self.runtime.add_conditional_edge(&from, &to, condition)?;
        }
        Ok(self.runtime)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_condition_matching() {
        assert!(EdgeCondition::Always.matches(None));
        assert!(!EdgeCondition::Always.matches(Some("relevant")));

        assert!(EdgeCondition::on("relevant").matches(Some("relevant")));
        assert!(!EdgeCondition::on("relevant").matches(Some("needs_search")));
        assert!(!EdgeCondition::on("relevant").matches(None));
    }

    #[test]
    fn unknown_edge_targets_are_rejected() {
        let result = GraphBuilder::new()
            .entry("missing")
            .edge("missing", END)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn end_is_always_present_but_not_listed() {
        let runtime = GraphRuntime::new();
        assert!(runtime.get_node(END).is_some());
        assert!(runtime.node_ids().is_empty());
        assert!(runtime.edges().is_empty());
    }
}
