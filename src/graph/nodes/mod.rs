// Graph Nodes Module
// One node per pipeline stage

pub mod generate;
pub mod grade;
pub mod retrieve;
pub mod search_online;

pub use generate::{route_after_generation, GenerateNode, GenerationRoute};
pub use grade::GradeNode;
pub use retrieve::RetrieveNode;
pub use search_online::SearchOnlineNode;

/// Edge labels emitted by the nodes.
pub mod conditions {
    pub const NEEDS_SEARCH: &str = "needs_search";
    pub const RELEVANT: &str = "relevant";
    pub const HALLUCINATION: &str = "hallucination";
    pub const ANSWERS_QUESTION: &str = "answers_question";
    pub const QUESTION_NOT_ADDRESSED: &str = "question_not_addressed";
    pub const GAVE_UP: &str = "gave_up";
}
