use crate::config::SearchConfig;
use crate::search::{SearchError, SearchHit, SearchService};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for a Tavily-style JSON search API
pub struct TavilySearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_results: u32,
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    include_domains: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

impl TavilySearch {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        max_results: u32,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            max_results,
        })
    }

    pub fn from_config(config: &SearchConfig, api_key: String) -> Result<Self, SearchError> {
        Self::new(
            &config.endpoint,
            api_key,
            config.max_results,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl SearchService for TavilySearch {
    async fn search(
        &self,
        query: &str,
        domain_scope: Option<&str>,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let request = TavilyRequest {
            api_key: &self.api_key,
            query,
            max_results: self.max_results,
            include_domains: domain_scope.into_iter().collect(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api { status, message });
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        tracing::debug!(query, hits = parsed.results.len(), "Search completed");

        Ok(parsed
            .results
            .into_iter()
            .map(|r| SearchHit {
                url: r.url,
                title: r.title,
                snippet: r.content,
            })
            .collect())
    }
}
