//! Tavily search API client

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{SearchClient, SearchError, SearchRequest, SearchResponse};
use crate::config::SearchConfig;

/// Tavily web search client
pub struct TavilyClient {
    api_key: Option<String>,
    api_key_env: String,
    base_url: String,
    http: Client,
}

impl TavilyClient {
    /// Create a new client from configuration
    ///
    /// The API key is read from the environment variable named in config.
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        debug!(?config, "TavilyClient::from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(SearchError::Network)?;

        Ok(Self {
            api_key: config.api_key(),
            api_key_env: config.api_key_env.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn build_request_body(&self, api_key: &str, request: &SearchRequest) -> serde_json::Value {
        serde_json::json!({
            "api_key": api_key,
            "query": request.query.trim(),
            "max_results": request.max_results,
            "search_depth": request.depth.as_str(),
        })
    }
}

#[async_trait]
impl SearchClient for TavilyClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        debug!(query = %request.query, depth = %request.depth.as_str(), %request.max_results, "TavilyClient::search: called");
        request.validate()?;
        let api_key = self.api_key.as_deref().ok_or_else(|| SearchError::MissingApiKey {
            env: self.api_key_env.clone(),
        })?;

        let url = format!("{}/search", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&self.build_request_body(api_key, request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            debug!(%status, "TavilyClient::search: API error");
            return Err(SearchError::ApiError { status, message });
        }

        let body = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| SearchError::Decode(e.to_string()))?;
        debug!(result_count = parsed.results.len(), "TavilyClient::search: success");
        Ok(parsed)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
