use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Model and backend summary, including whether the chat endpoint answers.
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let reachable = state.llm.health_check().await.unwrap_or(false);
    let graph = state.pipeline.graph();

    Json(json!({
        "llm": {
            "provider": state.llm.name(),
            "model": state.llm.model(),
            "reachable": reachable,
        },
        "embedding_model": state.settings.embedding.model,
        "storage": state.settings.storage.backend,
        "search_provider": state.settings.search.provider,
        "graph": {
            "nodes": graph.node_ids(),
            "edges": graph
                .edges()
                .into_iter()
                .map(|t| json!({ "from": t.from, "on": t.condition.to_string(), "to": t.to }))
                .collect::<Vec<_>>(),
        },
    }))
}
