use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use crate::graph::GraphError;

/// Failures of the indexing and question-answering pipeline.
///
/// None of these are recovered locally; they propagate to the caller of
/// `index_document` or `answer_question`.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("invalid question: {0}")]
    InvalidQuestion(String),
    #[error("indexing failed: {0}")]
    Indexing(String),
    #[error("no index exists for session '{0}'; upload a document first")]
    NoIndex(String),
    #[error("retrieval failed: {0}")]
    Retrieval(String),
    #[error("classification failed: {0}")]
    Classification(String),
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("web search failed: {0}")]
    Search(String),
    #[error("could not produce a grounded answer after {attempts} attempts")]
    Ungrounded { attempts: usize },
    #[error(transparent)]
    Graph(GraphError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unprocessable: {0}")]
    Unprocessable(String),
    #[error("upstream error: {0}")]
    BadGateway(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        let message = err.to_string();
        match err {
            RagError::InvalidDocument(_) | RagError::InvalidQuestion(_) => {
                ApiError::BadRequest(message)
            }
            RagError::NoIndex(_) => ApiError::Conflict(message),
            RagError::Ungrounded { .. } => ApiError::Unprocessable(message),
            RagError::Indexing(_)
            | RagError::Retrieval(_)
            | RagError::Classification(_)
            | RagError::Generation(_)
            | RagError::Search(_) => ApiError::BadGateway(message),
            RagError::Graph(_) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        if status.is_server_error() {
            tracing::error!("{}", message);
        }

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
