//! Entry points for indexing a document and answering a question.

use std::sync::Arc;

use serde::Serialize;

use super::builder::build_rag_graph;
use super::node::{GraphError, NodeContext};
use super::runtime::GraphRuntime;
use super::state::{QueryOutcome, QueryState};
use crate::core::config::AppSettings;
use crate::core::errors::RagError;
use crate::rag::{
    AnswerGenerator, DocumentIndexer, Embedder, IndexSummary, Judge, RagStore, Retriever,
    SplitterConfig,
};
use crate::tools::WebSearch;

/// External collaborators the pipeline is wired with.
#[derive(Clone)]
pub struct PipelineServices {
    pub store: Arc<dyn RagStore>,
    pub embedder: Arc<dyn Embedder>,
    pub judge: Arc<dyn Judge>,
    pub generator: Arc<dyn AnswerGenerator>,
    pub search: Arc<dyn WebSearch>,
}

/// A grounded answer and how it was reached.
#[derive(Debug, Clone, Serialize)]
pub struct QueryAnswer {
    pub answer: String,
    /// Number of answer generations.
    pub attempts: usize,
    pub searches: usize,
    /// Node IDs in execution order.
    pub trace: Vec<String>,
}

pub struct RagPipeline {
    services: PipelineServices,
    indexer: DocumentIndexer,
    graph: GraphRuntime,
    top_k: usize,
    search_max_results: usize,
    max_regenerations: usize,
}

impl RagPipeline {
    pub fn new(services: PipelineServices, settings: &AppSettings) -> Result<Self, RagError> {
        let indexer = DocumentIndexer::new(
            services.store.clone(),
            services.embedder.clone(),
            SplitterConfig {
                chunk_size: settings.rag.chunk_size,
                chunk_overlap: settings.rag.chunk_overlap,
            },
            settings.rag.max_document_bytes,
        );
        let graph = build_rag_graph(&settings.graph)?;

        Ok(Self {
            services,
            indexer,
            graph,
            top_k: settings.rag.top_k,
            search_max_results: settings.search.max_results,
            max_regenerations: settings.graph.max_regenerations,
        })
    }

    pub fn graph(&self) -> &GraphRuntime {
        &self.graph
    }

    /// Replace the session's index with `text`.
    pub async fn index_document(
        &self,
        session_id: &str,
        source: &str,
        text: &str,
    ) -> Result<IndexSummary, RagError> {
        self.indexer.index(session_id, source, text).await
    }

    pub async fn remove_document(&self, session_id: &str) -> Result<usize, RagError> {
        self.indexer.remove(session_id).await
    }

    /// Run the graph for one question against the session's index.
    pub async fn answer_question(
        &self,
        session_id: &str,
        question: &str,
    ) -> Result<QueryAnswer, RagError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::InvalidQuestion("question is empty".to_string()));
        }

        let retriever = Retriever::new(
            self.services.store.clone(),
            self.services.embedder.clone(),
            session_id,
            self.top_k,
        );
        let ctx = NodeContext {
            retriever: &retriever,
            judge: self.services.judge.as_ref(),
            generator: self.services.generator.as_ref(),
            search: self.services.search.as_ref(),
            search_max_results: self.search_max_results,
            max_regenerations: self.max_regenerations,
        };

        let mut state = QueryState::new(question);
        self.graph.run(&mut state, &ctx).await?;
        tracing::info!(
            session_id,
            trace = %state.trace.join(" -> "),
            "Query finished with {:?}",
            state.outcome
        );

        match (state.outcome, state.answer) {
            (Some(QueryOutcome::Answered), Some(answer)) => Ok(QueryAnswer {
                answer,
                attempts: state.generations,
                searches: state.searches,
                trace: state.trace,
            }),
            (Some(QueryOutcome::GaveUp), _) => Err(RagError::Ungrounded {
                attempts: state.generations,
            }),
            _ => Err(RagError::Graph(
                GraphError::new("runtime", "graph ended without an answer").with_trace(state.trace),
            )),
        }
    }
}
