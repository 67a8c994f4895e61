// Graph Module
// StateGraph that sequences retrieval, grading, generation and web search

pub mod builder;
pub mod node;
pub mod nodes;
pub mod pipeline;
pub mod runtime;
pub mod state;


pub use builder::build_rag_graph;
pub use node::{GraphError, Node, NodeContext, NodeOutput};
pub use pipeline::{PipelineServices, QueryAnswer, RagPipeline};
pub use runtime::{EdgeCondition, GraphRuntime, Transition, END};
pub use state::{QueryOutcome, QueryState};
