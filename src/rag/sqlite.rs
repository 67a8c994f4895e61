//! SQLite-backed RAG store.
//!
//! Chunk text and metadata live in SQLite, embeddings as little-endian f32
//! blobs. Search is brute-force cosine similarity over one collection.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::chunk::{Chunk, ChunkMetadata};
use super::store::{ChunkSearchResult, RagStore, StoredChunk};
use super::vector_math::rank_descending_by_cosine;
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

pub struct SqliteRagStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteRagStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.index_db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool, db_path };
        store.init_schema().await?;
        tracing::info!("RAG index opened at {}", store.db_path.display());
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS rag_chunks (
                chunk_id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                position INTEGER NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_rag_collection ON rag_chunks(collection, position)",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> StoredChunk {
        let metadata: Option<String> = row.get("metadata");
        let metadata = metadata.and_then(|raw| serde_json::from_str::<ChunkMetadata>(&raw).ok());

        StoredChunk {
            chunk_id: row.get("chunk_id"),
            collection: row.get("collection"),
            chunk: Chunk {
                content: row.get("content"),
                metadata,
            },
        }
    }
}

#[async_trait]
impl RagStore for SqliteRagStore {
    async fn replace_collection(
        &self,
        collection: &str,
        items: Vec<(StoredChunk, Vec<f32>)>,
    ) -> Result<usize, ApiError> {
        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        sqlx::query("DELETE FROM rag_chunks WHERE collection = ?1")
            .bind(collection)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        for (position, (stored, embedding)) in items.iter().enumerate() {
            let metadata = stored
                .chunk
                .metadata
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(ApiError::internal)?;

            sqlx::query(
                "INSERT INTO rag_chunks
                 (chunk_id, collection, position, content, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&stored.chunk_id)
            .bind(collection)
            .bind(position as i64)
            .bind(&stored.chunk.content)
            .bind(metadata)
            .bind(Self::serialize_embedding(embedding))
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(items.len())
    }

    async fn nearest(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, ApiError> {
        let rows = sqlx::query(
            "SELECT chunk_id, collection, content, metadata, embedding
             FROM rag_chunks
             WHERE collection = ?1
             ORDER BY position",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let embeddings: Vec<Vec<f32>> = rows
            .iter()
            .map(|row| {
                let bytes: Vec<u8> = row.get("embedding");
                Self::deserialize_embedding(&bytes)
            })
            .collect();
        let views: Vec<&[f32]> = embeddings.iter().map(Vec::as_slice).collect();

        Ok(rank_descending_by_cosine(query_embedding, &views)
            .into_iter()
            .take(limit)
            .map(|(idx, score)| ChunkSearchResult {
                chunk: Self::row_to_chunk(&rows[idx]),
                score,
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rag_chunks WHERE collection = ?1")
            .bind(collection)
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }

    async fn delete_collection(&self, collection: &str) -> Result<usize, ApiError> {
        let result = sqlx::query("DELETE FROM rag_chunks WHERE collection = ?1")
            .bind(collection)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(result.rows_affected() as usize)
    }
}
