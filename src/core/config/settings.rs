//! Typed view over the merged YAML configuration.
//!
//! `ConfigService::load_config` yields a loosely typed `serde_json::Value`;
//! `AppSettings::from_value` turns it into the structs below, filling any
//! missing key with its default and applying environment overrides for
//! secrets.

use std::env;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::ApiError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub rag: RagSettings,
    pub search: SearchSettings,
    pub graph: GraphSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<i32>,
    pub request_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            max_tokens: None,
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Falls back to `llm.base_url` when unset.
    pub base_url: Option<String>,
    /// Falls back to `llm.api_key` when unset.
    pub api_key: Option<String>,
    pub model: String,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            batch_size: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub max_document_bytes: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            chunk_overlap: 30,
            top_k: 4,
            max_document_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    #[default]
    Tavily,
    Brave,
    DuckDuckGo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub provider: SearchProvider,
    pub max_results: usize,
    pub tavily_api_key: Option<String>,
    pub brave_search_api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            provider: SearchProvider::Tavily,
            max_results: 2,
            tavily_api_key: None,
            brave_search_api_key: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub max_steps: usize,
    /// How many times an ungrounded answer may be regenerated before giving up.
    pub max_regenerations: usize,
    pub node_timeout_secs: u64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            max_steps: 25,
            max_regenerations: 3,
            node_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
}

impl AppSettings {
    pub fn from_value(config: &Value) -> Result<Self, ApiError> {
        let mut settings: AppSettings = serde_json::from_value(config.clone())
            .map_err(|e| ApiError::BadRequest(format!("Invalid config: {}", e)))?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(key) = non_empty_env("OPENAI_API_KEY") {
            self.llm.api_key.get_or_insert(key);
        }
        if let Some(key) = non_empty_env("TAVILY_API_KEY") {
            self.search.tavily_api_key.get_or_insert(key);
        }
        if let Some(key) = non_empty_env("BRAVE_SEARCH_API_KEY") {
            self.search.brave_search_api_key.get_or_insert(key);
        }
        if let Some(port) = non_empty_env("PORT").and_then(|v| v.parse::<u16>().ok()) {
            self.server.port = port;
        }
    }

    pub fn embedding_base_url(&self) -> &str {
        self.embedding
            .base_url
            .as_deref()
            .unwrap_or(&self.llm.base_url)
    }

    pub fn embedding_api_key(&self) -> Option<&str> {
        self.embedding
            .api_key
            .as_deref()
            .or(self.llm.api_key.as_deref())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
