//! Tavily search provider.
//!
//! Tavily is an AI-oriented search API returning pre-extracted content
//! with relevance scores, which maps directly onto [`SourceRecord`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::SearchProvider;
use crate::core::SourceRecord;
use crate::error::{ResearchError, Result};

/// Default Tavily API endpoint.
const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Hard cap on results per search call.
const MAX_RESULTS_CAP: usize = 20;

/// Request body for the Tavily `/search` endpoint.
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
}

/// Response body from the Tavily `/search` endpoint.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// A single Tavily result.
#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: Option<f64>,
}

/// Tavily-backed [`SearchProvider`].
pub struct TavilyProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    search_depth: String,
}

impl TavilyProvider {
    /// Creates a provider with the given API key and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Transport`] if the HTTP client cannot be
    /// constructed.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResearchError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
            })?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            search_depth: "advanced".to_string(),
        })
    }

    /// Overrides the API base URL. Intended for tests and proxies.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the search depth (`"basic"` or `"advanced"`).
    #[must_use]
    pub fn with_search_depth(mut self, depth: impl Into<String>) -> Self {
        self.search_depth = depth.into();
        self
    }
}

impl std::fmt::Debug for TavilyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilyProvider")
            .field("base_url", &self.base_url)
            .field("search_depth", &self.search_depth)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    fn name(&self) -> &'static str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SourceRecord>> {
        let request = SearchRequest {
            query,
            max_results: max_results.clamp(1, MAX_RESULTS_CAP),
            search_depth: &self.search_depth,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ResearchError::Transport {
                message: format!("search request failed: {e}"),
                status: e.status().map(|s| s.as_u16()),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResearchError::Transport {
                message: format!("search returned {status}: {body}"),
                status: Some(status.as_u16()),
            });
        }

        let parsed: SearchResponse =
            response.json().await.map_err(|e| ResearchError::Transport {
                message: format!("failed to parse search response: {e}"),
                status: Some(status.as_u16()),
            })?;

        Ok(parsed
            .results
            .into_iter()
            .map(|r| SourceRecord {
                title: r.title,
                url: r.url,
                snippet: r.content,
                score: r.score,
                why_matters: None,
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn provider(base_url: &str) -> TavilyProvider {
        TavilyProvider::new("test-key", Duration::from_secs(5))
            .unwrap_or_else(|e| panic!("provider build failed: {e}"))
            .with_base_url(base_url)
    }

    #[tokio::test]
    async fn test_search_parses_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/search")
            .match_header("api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results": [
                    {"title": "T1", "url": "https://a.example", "content": "C1", "score": 0.9},
                    {"title": "T2", "url": "https://b.example", "content": "C2", "score": 0.4}
                ]}"#,
            )
            .create_async()
            .await;

        let results = provider(&server.url())
            .search("solid state batteries", 5)
            .await
            .unwrap_or_else(|e| panic!("search failed: {e}"));

        mock.assert_async().await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "T1");
        assert_eq!(results[0].url, "https://a.example");
        assert_eq!(results[0].snippet, "C1");
        assert_eq!(results[0].score, Some(0.9));
        assert!(results[0].why_matters.is_none());
    }

    #[tokio::test]
    async fn test_search_empty_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results": []}"#)
            .create_async()
            .await;

        let results = provider(&server.url())
            .search("anything", 5)
            .await
            .unwrap_or_else(|e| panic!("search failed: {e}"));
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_error_status_is_transport() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let err = provider(&server.url())
            .search("anything", 5)
            .await
            .err()
            .unwrap_or_else(|| panic!("expected error"));
        assert!(matches!(
            err,
            ResearchError::Transport {
                status: Some(429),
                ..
            }
        ));
        assert!(err.is_retryable());
    }
}
