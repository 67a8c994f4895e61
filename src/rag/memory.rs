//! In-process vector store. Collections vanish with the process.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{ChunkSearchResult, RagStore, StoredChunk};
use super::vector_math::rank_descending_by_cosine;
use crate::core::errors::ApiError;

#[derive(Default)]
pub struct InMemoryRagStore {
    collections: RwLock<HashMap<String, Vec<(StoredChunk, Vec<f32>)>>>,
}

impl InMemoryRagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RagStore for InMemoryRagStore {
    async fn replace_collection(
        &self,
        collection: &str,
        items: Vec<(StoredChunk, Vec<f32>)>,
    ) -> Result<usize, ApiError> {
        let stored = items.len();
        let mut collections = self.collections.write().await;
        collections.insert(collection.to_string(), items);
        Ok(stored)
    }

    async fn nearest(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, ApiError> {
        let collections = self.collections.read().await;
        let Some(items) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let embeddings: Vec<&[f32]> = items.iter().map(|(_, emb)| emb.as_slice()).collect();
        Ok(rank_descending_by_cosine(query_embedding, &embeddings)
            .into_iter()
            .take(limit)
            .map(|(idx, score)| ChunkSearchResult {
                chunk: items[idx].0.clone(),
                score,
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize, ApiError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map_or(0, Vec::len))
    }

    async fn delete_collection(&self, collection: &str) -> Result<usize, ApiError> {
        let mut collections = self.collections.write().await;
        Ok(collections.remove(collection).map_or(0, |items| items.len()))
    }
}
