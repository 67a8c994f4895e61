//! Retrieval side of the pipeline.
//!
//! - `TextSplitter` / `DocumentIndexer`: chunk, embed and store an uploaded document
//! - `Retriever`: nearest-chunk lookup for a question
//! - `Judge` / `AnswerGenerator`: yes/no classifiers and answer generation
//! - `grade_chunks`: relevance filtering with the "needs online search" flag

mod chunk;
mod embedder;
mod grader;
mod indexer;
mod judge;
mod memory;
pub mod prompts;
mod retriever;
mod splitter;
mod sqlite;
mod store;
mod vector_math;

pub use chunk::{Chunk, ChunkMetadata};
pub use embedder::{Embedder, LlmEmbedder};
pub use grader::{grade_chunks, GradeOutcome};
pub use indexer::{DocumentIndexer, IndexSummary};
pub use judge::{parse_verdict, AnswerGenerator, Criterion, Judge, LlmJudge, Verdict};
pub use memory::InMemoryRagStore;
pub use retriever::Retriever;
pub use splitter::{SplitterConfig, TextSplitter};
pub use sqlite::SqliteRagStore;
pub use store::{ChunkSearchResult, RagStore, StoredChunk};
pub use vector_math::cosine_similarity;
