use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::errors::ApiError;

/// Client for any server speaking the OpenAI `/v1` chat and embeddings API
/// (OpenAI itself, LM Studio, vLLM, Ollama's compatibility layer, ...).
#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            client,
        })
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn chat_body(&self, request: &ChatRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(t));
            }
            if let Some(format) = &request.response_format {
                obj.insert("response_format".to_string(), format.clone());
            }
        }

        body
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/v1/models", self.base_url);
        let res = self.authorize(self.client.get(&url)).send().await;
        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.chat_body(&request);

        let res = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::BadGateway(format!("chat request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::BadGateway(format!(
                "chat completion returned {}: {}",
                status, text
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ApiError::BadGateway(format!("invalid chat response: {}", e)))?;

        extract_message_content(&payload)
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": inputs,
        });

        let res = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::BadGateway(format!("embedding request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::BadGateway(format!(
                "embedding endpoint returned {}: {}",
                status, text
            )));
        }

        let payload: EmbeddingResponse = res
            .json()
            .await
            .map_err(|e| ApiError::BadGateway(format!("invalid embedding response: {}", e)))?;

        order_embeddings(payload.data, inputs.len())
    }
}

fn extract_message_content(payload: &Value) -> Result<String, ApiError> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| ApiError::BadGateway("chat response has no message content".to_string()))
}

/// Servers may return embeddings out of order; `index` restores input order.
fn order_embeddings(
    mut items: Vec<EmbeddingItem>,
    expected: usize,
) -> Result<Vec<Vec<f32>>, ApiError> {
    if items.len() != expected {
        return Err(ApiError::BadGateway(format!(
            "expected {} embeddings, got {}",
            expected,
            items.len()
        )));
    }

    if items.iter().all(|item| item.index.is_some()) {
        items.sort_by_key(|item| item.index.unwrap_or(usize::MAX));
    }

    Ok(items.into_iter().map(|item| item.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ChatMessage;

    fn provider() -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(
            "http://localhost:1234/",
            Some("sk-test".to_string()),
            "test-model",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        assert_eq!(provider().base_url, "http://localhost:1234");
    }

    #[test]
    fn blank_api_key_is_ignored() {
        let provider = OpenAiCompatibleProvider::new(
            "http://localhost:1234",
            Some("  ".to_string()),
            "m",
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(provider.api_key.is_none());
    }

    #[test]
    fn chat_body_carries_optional_fields() {
        let request = ChatRequest::new(vec![ChatMessage::user("hello")])
            .with_temperature(0.0)
            .with_json_schema("binary_score", json!({"type": "object"}));

        let body = provider().chat_body(&request);

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn message_content_is_extracted() {
        let payload = json!({"choices": [{"message": {"role": "assistant", "content": "1985"}}]});
        assert_eq!(extract_message_content(&payload).unwrap(), "1985");

        let empty = json!({"choices": []});
        assert!(extract_message_content(&empty).is_err());
    }

    #[test]
    fn embeddings_are_reordered_by_index() {
        let items = vec![
            EmbeddingItem {
                index: Some(1),
                embedding: vec![2.0],
            },
            EmbeddingItem {
                index: Some(0),
                embedding: vec![1.0],
            },
        ];
        let ordered = order_embeddings(items, 2).unwrap();
        assert_eq!(ordered, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn embedding_count_mismatch_is_an_error() {
        let items = vec![EmbeddingItem {
            index: Some(0),
            embedding: vec![1.0],
        }];
        assert!(order_embeddings(items, 2).is_err());
    }

    #[tokio::test]
    #[ignore]
    async fn live_openai_compatible_chat() {
        let base_url =
            std::env::var("ADVRAG_LIVE_LLM_URL").unwrap_or_else(|_| "http://localhost:1234".into());
        let provider = OpenAiCompatibleProvider::new(
            &base_url,
            std::env::var("OPENAI_API_KEY").ok(),
            std::env::var("ADVRAG_LIVE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()),
            Duration::from_secs(60),
        )
        .unwrap();

        let reply = provider
            .chat(ChatRequest::new(vec![ChatMessage::user("Say hello")]).with_max_tokens(Some(10)))
            .await;
        match reply {
            Ok(text) => println!("chat response: {}", text),
            Err(e) => panic!("failed to reach {}: {}", base_url, e),
        }
    }
}
