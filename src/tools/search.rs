use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

use crate::core::config::settings::SearchSettings;
use crate::core::config::SearchProvider;
use crate::core::errors::ApiError;
use crate::rag::{Chunk, ChunkMetadata};

/// Source tag of the chunk produced by a web search.
pub const WEB_SEARCH_SOURCE: &str = "web_search";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// External web search collaborator.
#[async_trait]
pub trait WebSearch: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `max_results` results for `query`, best first.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, ApiError>;
}

/// Fold search results into a single context chunk, contents joined by newlines.
pub fn results_to_chunk(results: &[SearchResult]) -> Chunk {
    let content = results
        .iter()
        .map(|r| r.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    Chunk::new(content).with_metadata(ChunkMetadata {
        source: WEB_SEARCH_SOURCE.to_string(),
        chunk_index: None,
        start_offset: None,
    })
}

pub struct HttpWebSearch {
    client: Client,
    provider: SearchProvider,
    tavily_api_key: Option<String>,
    brave_api_key: Option<String>,
}

impl HttpWebSearch {
    pub fn from_settings(settings: &SearchSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(ApiError::internal)?;

        let search = Self {
            client,
            provider: settings.provider,
            tavily_api_key: non_blank(settings.tavily_api_key.as_deref()),
            brave_api_key: non_blank(settings.brave_search_api_key.as_deref()),
        };

        match search.provider {
            SearchProvider::Tavily if search.tavily_api_key.is_none() => {
                tracing::warn!("search.provider is tavily but no Tavily API key is configured")
            }
            SearchProvider::Brave if search.brave_api_key.is_none() => {
                tracing::warn!("search.provider is brave but no Brave API key is configured")
            }
            _ => {}
        }

        Ok(search)
    }

    async fn tavily_search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ApiError> {
        let api_key = self
            .tavily_api_key
            .as_deref()
            .ok_or_else(|| ApiError::BadGateway("Tavily API key is not configured".to_string()))?;

        let response = self
            .client
            .post("https://api.tavily.com/search")
            .json(&json!({
                "api_key": api_key,
                "query": query,
                "max_results": max_results,
                "search_depth": "basic",
            }))
            .send()
            .await
            .map_err(|e| ApiError::BadGateway(format!("Tavily request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::BadGateway(format!(
                "Tavily search failed: {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ApiError::BadGateway(format!("invalid Tavily response: {}", e)))?;
        Ok(parse_tavily(&payload))
    }

    async fn brave_search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ApiError> {
        let api_key = self
            .brave_api_key
            .as_deref()
            .ok_or_else(|| ApiError::BadGateway("Brave API key is not configured".to_string()))?;

        let url = format!(
            "https://api.search.brave.com/res/v1/web/search?q={}&count={}",
            urlencoding::encode(query),
            max_results
        );

        let response = self
            .client
            .get(url)
            .header("X-Subscription-Token", api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::BadGateway(format!("Brave request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::BadGateway(format!(
                "Brave search failed: {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ApiError::BadGateway(format!("invalid Brave response: {}", e)))?;
        Ok(parse_brave(&payload))
    }

    async fn duckduckgo_search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        let url = format!(
            "https://api.duckduckgo.com/?q={}&format=json&no_redirect=1&no_html=1",
            urlencoding::encode(query)
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::BadGateway(format!("DuckDuckGo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::BadGateway(format!(
                "DuckDuckGo search failed: {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ApiError::BadGateway(format!("invalid DuckDuckGo response: {}", e)))?;
        Ok(parse_duckduckgo(&payload))
    }
}

#[async_trait]
impl WebSearch for HttpWebSearch {
    fn name(&self) -> &str {
        match self.provider {
            SearchProvider::Tavily => "tavily",
            SearchProvider::Brave => "brave",
            SearchProvider::DuckDuckGo => "duckduckgo",
        }
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, ApiError> {
        let mut results = match self.provider {
            SearchProvider::Tavily => self.tavily_search(query, max_results).await?,
            SearchProvider::Brave => self.brave_search(query, max_results).await?,
            SearchProvider::DuckDuckGo => self.duckduckgo_search(query).await?,
        };
        results.truncate(max_results);
        Ok(results)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn str_field<'a>(item: &'a Value, key: &str) -> &'a str {
    item.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn parse_tavily(payload: &Value) -> Vec<SearchResult> {
    payload
        .get("results")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter(|item| !str_field(item, "content").is_empty())
                .map(|item| SearchResult {
                    title: str_field(item, "title").to_string(),
                    url: str_field(item, "url").to_string(),
                    content: str_field(item, "content").to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_brave(payload: &Value) -> Vec<SearchResult> {
    payload
        .get("web")
        .and_then(|w| w.get("results"))
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter(|item| !str_field(item, "url").is_empty())
                .map(|item| SearchResult {
                    title: str_field(item, "title").to_string(),
                    url: str_field(item, "url").to_string(),
                    content: str_field(item, "description").to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_duckduckgo(payload: &Value) -> Vec<SearchResult> {
    let mut results = Vec::new();

    let abstract_text = str_field(payload, "AbstractText");
    let abstract_url = str_field(payload, "AbstractURL");
    if !abstract_text.is_empty() && !abstract_url.is_empty() {
        results.push(SearchResult {
            title: str_field(payload, "Heading").to_string(),
            url: abstract_url.to_string(),
            content: abstract_text.to_string(),
        });
    }

    for key in ["Results", "RelatedTopics"] {
        if let Some(items) = payload.get(key).and_then(|v| v.as_array()) {
            extract_ddg_topics(items, &mut results);
        }
    }

    results
}

fn extract_ddg_topics(items: &[Value], results: &mut Vec<SearchResult>) {
    for item in items {
        if let Some(topics) = item.get("Topics").and_then(|v| v.as_array()) {
            extract_ddg_topics(topics, results);
            continue;
        }
        let text = str_field(item, "Text");
        let url = str_field(item, "FirstURL");
        if text.is_empty() || url.is_empty() {
            continue;
        }
        results.push(SearchResult {
            title: text.split(" - ").next().unwrap_or(text).to_string(),
            url: url.to_string(),
            content: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(content: &str) -> SearchResult {
        SearchResult {
            title: "t".to_string(),
            url: "https://example.com".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn results_join_into_one_tagged_chunk() {
        let chunk = results_to_chunk(&[result("Sunny today."), result("High of 25C.")]);

        assert_eq!(chunk.content, "Sunny today.\nHigh of 25C.");
        assert_eq!(chunk.source(), Some(WEB_SEARCH_SOURCE));
    }

    #[test]
    fn no_results_still_yield_a_chunk() {
        let chunk = results_to_chunk(&[]);
        assert_eq!(chunk.content, "");
        assert_eq!(chunk.source(), Some(WEB_SEARCH_SOURCE));
    }

    #[test]
    fn tavily_results_are_parsed() {
        let payload = json!({
            "query": "weather",
            "results": [
                {"title": "Forecast", "url": "https://a", "content": "Rain expected."},
                {"title": "Empty", "url": "https://b", "content": ""}
            ]
        });

        let results = parse_tavily(&payload);
        assert_eq!(results, vec![SearchResult {
            title: "Forecast".to_string(),
            url: "https://a".to_string(),
            content: "Rain expected.".to_string(),
        }]);
    }

    #[test]
    fn brave_results_use_description_as_content() {
        let payload = json!({
            "web": { "results": [{"title": "T", "url": "https://x", "description": "desc"}] }
        });
        let results = parse_brave(&payload);
        assert_eq!(results[0].content, "desc");
    }

    #[test]
    fn duckduckgo_topics_are_flattened() {
        let payload = json!({
            "Heading": "Rust",
            "AbstractText": "Rust is a language.",
            "AbstractURL": "https://rust-lang.org",
            "RelatedTopics": [
                {"Text": "Cargo - package manager", "FirstURL": "https://doc.rust-lang.org/cargo"},
                {"Topics": [{
                    "Text": "Clippy - linter",
                    "FirstURL": "https://github.com/rust-lang/rust-clippy"
                }]}
            ]
        });

        let results = parse_duckduckgo(&payload);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Rust");
        assert_eq!(results[2].title, "Clippy");
    }

    #[tokio::test]
    async fn missing_key_fails_instead_of_returning_nothing() {
        let search = HttpWebSearch::from_settings(&SearchSettings::default()).unwrap();
        assert!(matches!(
            search.search("weather", 2).await,
            Err(ApiError::BadGateway(_))
        ));
    }

    #[tokio::test]
    #[ignore]
    async fn live_tavily_search() {
        let settings = SearchSettings {
            tavily_api_key: std::env::var("TAVILY_API_KEY").ok(),
            ..SearchSettings::default()
        };
        let search = HttpWebSearch::from_settings(&settings).unwrap();
        let results = search.search("Rust programming language", 2).await.unwrap();
        assert!(results.len() <= 2);
    }
}
