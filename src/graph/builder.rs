// Graph Builder
// Declares the corrective-RAG state machine as an edge table

use std::time::Duration;

use super::node::GraphError;
use super::nodes::conditions::{
    ANSWERS_QUESTION, GAVE_UP, HALLUCINATION, NEEDS_SEARCH, QUESTION_NOT_ADDRESSED, RELEVANT,
};
use super::nodes::{GenerateNode, GradeNode, RetrieveNode, SearchOnlineNode};
use super::runtime::{GraphBuilder, GraphRuntime, END};
use crate::core::config::settings::GraphSettings;

/// Build the question-answering graph
///
/// ```text
/// retrieve ──────────────────────────▶ grade
/// grade          ─needs_search──────▶ search_online
/// grade          ─relevant──────────▶ generate
/// generate       ─hallucination─────▶ generate
/// generate       ─answers_question──▶ END
/// generate       ─question_not_addressed─▶ search_online
/// generate       ─gave_up───────────▶ END
/// search_online  ────────────────────▶ generate
/// ```
pub fn build_rag_graph(settings: &GraphSettings) -> Result<GraphRuntime, GraphError> {
    GraphBuilder::new()
        .entry(RetrieveNode::ID)
        .max_steps(settings.max_steps)
        .node_timeout(Duration::from_secs(settings.node_timeout_secs))
        .node(Box::new(RetrieveNode::new()))
        .node(Box::new(GradeNode::new()))
        .node(Box::new(GenerateNode::new()))
        .node(Box::new(SearchOnlineNode::new()))
        .edge(RetrieveNode::ID, GradeNode::ID)
        .conditional_edge(GradeNode::ID, SearchOnlineNode::ID, NEEDS_SEARCH)
        .conditional_edge(GradeNode::ID, GenerateNode::ID, RELEVANT)
        .conditional_edge(GenerateNode::ID, GenerateNode::ID, HALLUCINATION)
        .conditional_edge(GenerateNode::ID, END, ANSWERS_QUESTION)
        .conditional_edge(GenerateNode::ID, SearchOnlineNode::ID, QUESTION_NOT_ADDRESSED)
        .conditional_edge(GenerateNode::ID, END, GAVE_UP)
        .edge(SearchOnlineNode::ID, GenerateNode::ID)
        .build()
}
