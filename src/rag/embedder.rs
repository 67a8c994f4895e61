use std::sync::Arc;

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

/// Text to fixed-dimension vector. Indexing and querying must share one
/// implementation so both land in the same vector space.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;

    async fn embed_one(&self, input: &str) -> Result<Vec<f32>, ApiError> {
        let mut vectors = self.embed(&[input.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| ApiError::BadGateway("embedding service returned no vector".to_string()))
    }
}

/// Embeds through an LLM provider's embeddings endpoint, `batch_size` inputs
/// per request.
pub struct LlmEmbedder {
    provider: Arc<dyn LlmProvider>,
    batch_size: usize,
}

impl LlmEmbedder {
    pub fn new(provider: Arc<dyn LlmProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl Embedder for LlmEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let mut vectors = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(self.batch_size) {
            let embedded = self.provider.embed(batch).await?;
            if embedded.len() != batch.len() {
                return Err(ApiError::BadGateway(format!(
                    "embedding service returned {} vectors for {} inputs",
                    embedded.len(),
                    batch.len()
                )));
            }
            vectors.extend(embedded);
        }

        if let Some(first) = vectors.first() {
            let dim = first.len();
            if dim == 0 || vectors.iter().any(|v| v.len() != dim) {
                return Err(ApiError::BadGateway(
                    "embedding service returned inconsistent vector dimensions".to_string(),
                ));
            }
        }

        Ok(vectors)
    }
}
