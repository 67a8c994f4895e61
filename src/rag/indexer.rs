//! Document indexing: split, embed, then swap the session's collection.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::embedder::Embedder;
use super::splitter::{SplitterConfig, TextSplitter};
use super::store::{RagStore, StoredChunk};
use crate::core::errors::RagError;

/// What an upload produced.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    pub collection: String,
    pub source: String,
    pub chunk_count: usize,
    pub embedding_dim: usize,
    /// Hex SHA-256 of the document text.
    pub document_sha256: String,
    pub indexed_at: DateTime<Utc>,
}

pub struct DocumentIndexer {
    store: Arc<dyn RagStore>,
    embedder: Arc<dyn Embedder>,
    splitter: TextSplitter,
    max_document_bytes: usize,
}

impl DocumentIndexer {
    pub fn new(
        store: Arc<dyn RagStore>,
        embedder: Arc<dyn Embedder>,
        splitter: SplitterConfig,
        max_document_bytes: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            splitter: TextSplitter::new(splitter),
            max_document_bytes,
        }
    }

    /// Index `text` as the sole content of `collection`.
    ///
    /// Every chunk is embedded before the store is touched, so a failure
    /// leaves the previous index of the collection in place.
    pub async fn index(
        &self,
        collection: &str,
        source: &str,
        text: &str,
    ) -> Result<IndexSummary, RagError> {
        if text.len() > self.max_document_bytes {
            return Err(RagError::InvalidDocument(format!(
                "document is {} bytes, limit is {}",
                text.len(),
                self.max_document_bytes
            )));
        }
        if text.trim().is_empty() {
            return Err(RagError::InvalidDocument("document is empty".to_string()));
        }

        let chunks = self.splitter.split(text, source);
        let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();

        let embeddings = self
            .embedder
            .embed(&contents)
            .await
            .map_err(|e| RagError::Indexing(e.to_string()))?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::Indexing(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }
        let embedding_dim = embeddings.first().map_or(0, Vec::len);

        let items: Vec<(StoredChunk, Vec<f32>)> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                (
                    StoredChunk {
                        chunk_id: Uuid::new_v4().to_string(),
                        collection: collection.to_string(),
                        chunk,
                    },
                    embedding,
                )
            })
            .collect();

        let chunk_count = self
            .store
            .replace_collection(collection, items)
            .await
            .map_err(|e| RagError::Indexing(e.to_string()))?;

        let summary = IndexSummary {
            collection: collection.to_string(),
            source: source.to_string(),
            chunk_count,
            embedding_dim,
            document_sha256: hex::encode(Sha256::digest(text.as_bytes())),
            indexed_at: Utc::now(),
        };

        tracing::info!(
            collection = %summary.collection,
            chunks = summary.chunk_count,
            dim = summary.embedding_dim,
            sha256 = %summary.document_sha256,
            "Indexed document"
        );
        Ok(summary)
    }

    /// Drop the index of `collection`. Returns the number of removed chunks.
    pub async fn remove(&self, collection: &str) -> Result<usize, RagError> {
        let removed = self
            .store
            .delete_collection(collection)
            .await
            .map_err(|e| RagError::Indexing(e.to_string()))?;
        if removed == 0 {
            return Err(RagError::NoIndex(collection.to_string()));
        }
        tracing::info!(collection, removed, "Removed document index");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::{InMemoryRagStore, Retriever};
    use crate::testing::{FailingEmbedder, HashEmbedder};

    fn indexer(store: Arc<dyn RagStore>, embedder: Arc<dyn Embedder>) -> DocumentIndexer {
        DocumentIndexer::new(store, embedder, SplitterConfig::default(), 1024)
    }

    #[tokio::test]
    async fn index_reports_summary() {
        let store = Arc::new(InMemoryRagStore::new());
        let summary = indexer(store.clone(), Arc::new(HashEmbedder::default()))
            .index("s1", "car.txt", "The car was built in 1985.")
            .await
            .unwrap();

        assert_eq!(summary.chunk_count, 1);
        assert_eq!(summary.embedding_dim, HashEmbedder::DIM);
        assert_eq!(summary.document_sha256.len(), 64);
        assert_eq!(store.count("s1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_and_oversized_documents_are_rejected() {
        let store = Arc::new(InMemoryRagStore::new());
        let indexer = indexer(store, Arc::new(HashEmbedder::default()));

        assert!(matches!(
            indexer.index("s1", "doc", "  \n ").await,
            Err(RagError::InvalidDocument(_))
        ));
        assert!(matches!(
            indexer.index("s1", "doc", &"x".repeat(2048)).await,
            Err(RagError::InvalidDocument(_))
        ));
    }

    #[tokio::test]
    async fn embedder_failure_keeps_previous_index() {
        let store: Arc<dyn RagStore> = Arc::new(InMemoryRagStore::new());
        indexer(store.clone(), Arc::new(HashEmbedder::default()))
            .index("s1", "car.txt", "The car was built in 1985.")
            .await
            .unwrap();

        let result = indexer(store.clone(), Arc::new(FailingEmbedder))
            .index("s1", "weather.txt", "It rained all week.")
            .await;
        assert!(matches!(result, Err(RagError::Indexing(_))));

        let retriever = Retriever::new(store, Arc::new(HashEmbedder::default()), "s1", 4);
        let chunks = retriever.retrieve("When was the car built?").await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "The car was built in 1985.");
    }

    #[tokio::test]
    async fn reindexing_replaces_chunks() {
        let store = Arc::new(InMemoryRagStore::new());
        let indexer = indexer(store.clone(), Arc::new(HashEmbedder::default()));
        let long_doc = "Sentence number one is here. ".repeat(20);

        let first = indexer.index("s1", "long.txt", &long_doc).await.unwrap();
        assert!(first.chunk_count > 1);

        indexer.index("s1", "short.txt", "Just one line.").await.unwrap();
        assert_eq!(store.count("s1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn identical_documents_chunk_identically() {
        let store = Arc::new(InMemoryRagStore::new());
        let indexer = indexer(store, Arc::new(HashEmbedder::default()));
        let doc = "Marty went back to 1955. Doc built the machine. ".repeat(10);

        let a = indexer.index("s1", "doc", &doc).await.unwrap();
        let b = indexer.index("s2", "doc", &doc).await.unwrap();

        assert_eq!(a.chunk_count, b.chunk_count);
        assert_eq!(a.document_sha256, b.document_sha256);
    }

    #[tokio::test]
    async fn removing_missing_index_is_no_index() {
        let indexer = indexer(
            Arc::new(InMemoryRagStore::new()),
            Arc::new(HashEmbedder::default()),
        );
        assert!(matches!(indexer.remove("nobody").await, Err(RagError::NoIndex(_))));
    }
}
