//! RagStore trait: the vector index collaborator.
//!
//! Chunks live in named collections (one per session). A collection is only
//! ever replaced wholesale, never appended to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::chunk::Chunk;
use crate::core::errors::ApiError;

/// A chunk as persisted in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Unique chunk identifier.
    pub chunk_id: String,
    /// Collection (session) that owns this chunk.
    pub collection: String,
    pub chunk: Chunk,
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSearchResult {
    pub chunk: StoredChunk,
    /// Cosine similarity (higher = closer).
    pub score: f32,
}

#[async_trait]
pub trait RagStore: Send + Sync {
    /// Atomically swap the contents of `collection` for `items`.
    ///
    /// Readers observe either the old collection or the new one, never a mix.
    /// Returns the number of chunks stored.
    async fn replace_collection(
        &self,
        collection: &str,
        items: Vec<(StoredChunk, Vec<f32>)>,
    ) -> Result<usize, ApiError>;

    /// The `limit` chunks of `collection` nearest to `query_embedding`,
    /// closest first.
    async fn nearest(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, ApiError>;

    async fn count(&self, collection: &str) -> Result<usize, ApiError>;

    /// Drop a collection. Returns how many chunks were removed.
    async fn delete_collection(&self, collection: &str) -> Result<usize, ApiError>;
}
