use std::sync::Arc;

use super::chunk::Chunk;
use super::embedder::Embedder;
use super::store::RagStore;
use crate::core::errors::RagError;

/// Top-k nearest-chunk lookup over one session's collection.
///
/// Built per query from the shared store and embedder; holds no global state.
pub struct Retriever {
    store: Arc<dyn RagStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn RagStore>,
        embedder: Arc<dyn Embedder>,
        collection: impl Into<String>,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            collection: collection.into(),
            top_k: top_k.max(1),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The `top_k` chunks closest to `question`, nearest first.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<Chunk>, RagError> {
        let indexed = self
            .store
            .count(&self.collection)
            .await
            .map_err(|e| RagError::Retrieval(e.to_string()))?;
        if indexed == 0 {
            return Err(RagError::NoIndex(self.collection.clone()));
        }

        let query_embedding = self
            .embedder
            .embed_one(question)
            .await
            .map_err(|e| RagError::Retrieval(e.to_string()))?;

        let results = self
            .store
            .nearest(&self.collection, &query_embedding, self.top_k)
            .await
            .map_err(|e| RagError::Retrieval(e.to_string()))?;

        tracing::debug!(
            collection = %self.collection,
            hits = results.len(),
            best = results.first().map(|r| r.score),
            "Retrieved chunks"
        );
        Ok(results.into_iter().map(|r| r.chunk.chunk).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::{DocumentIndexer, InMemoryRagStore, SplitterConfig};
    use crate::testing::HashEmbedder;

    #[tokio::test]
    async fn missing_index_is_reported() {
        let retriever = Retriever::new(
            Arc::new(InMemoryRagStore::new()),
            Arc::new(HashEmbedder::default()),
            "empty-session",
            4,
        );

        assert!(matches!(
            retriever.retrieve("anything?").await,
            Err(RagError::NoIndex(session)) if session == "empty-session"
        ));
    }

    #[tokio::test]
    async fn returns_at_most_top_k_chunks() {
        let store: Arc<dyn RagStore> = Arc::new(InMemoryRagStore::new());
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());
        let doc = "Paragraph about engines and gearboxes. ".repeat(40);
        DocumentIndexer::new(store.clone(), embedder.clone(), SplitterConfig::default(), 1 << 20)
            .index("s1", "doc", &doc)
            .await
            .unwrap();

        let retriever = Retriever::new(store, embedder, "s1", 2);
        assert_eq!(retriever.retrieve("engines?").await.unwrap().len(), 2);
    }
}
