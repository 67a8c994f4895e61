use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use advrag_backend::core;
use advrag_backend::core::config::AppPaths;
use advrag_backend::server;
use advrag_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    core::logging::init(&paths);
    let state = AppState::initialize_with_paths(paths).await?;

    let bind_addr = format!("{}:{}", state.settings.server.host, state.settings.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("ADVRAG_PORT={}", addr.port());
    tracing::info!(
        "Listening on {} (graph: {} nodes, {} edges)",
        addr,
        state.pipeline.graph().node_ids().len(),
        state.pipeline.graph().edges().len()
    );

    let app: Router = server::router::router(state.clone());
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
