//! Web search module
//!
//! The search-provider boundary: a free-text query in, ranked text snippets
//! with source URLs out. Any failure is one opaque [`SearchError`]; callers
//! never see partial results.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

mod context;
mod tavily;

pub use context::{ContextEntry, SearchContext};
pub use tavily::TavilyClient;

use crate::config::SearchConfig;

/// Largest result count the provider accepts
pub const MAX_RESULTS_LIMIT: u32 = 20;

/// How thoroughly the provider should search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

impl SearchDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchDepth::Basic => "basic",
            SearchDepth::Advanced => "advanced",
        }
    }
}

/// One search call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub depth: SearchDepth,
    pub max_results: u32,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, depth: SearchDepth, max_results: u32) -> Self {
        Self {
            query: query.into(),
            depth,
            max_results,
        }
    }

    /// Reject requests the provider would refuse, before any network I/O
    pub fn validate(&self) -> Result<(), SearchError> {
        debug!(query_len = self.query.len(), %self.max_results, "SearchRequest::validate: called");
        if self.query.trim().is_empty() {
            return Err(SearchError::InvalidRequest("query must not be empty".to_string()));
        }
        if self.max_results == 0 || self.max_results > MAX_RESULTS_LIMIT {
            return Err(SearchError::InvalidRequest(format!(
                "max_results must be within 1..={}, got {}",
                MAX_RESULTS_LIMIT, self.max_results
            )));
        }
        Ok(())
    }
}

/// A single ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    pub content: String,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Provider response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub response_time: Option<f64>,
}

/// Errors that can occur talking to the search provider
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Missing API key: set the {env} environment variable")]
    MissingApiKey { env: String },

    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    #[error("Search API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Search request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to decode search response: {0}")]
    Decode(String),
}

/// Stateless web search client
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run one query
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError>;

    /// Whether credentials are present; stages check this before any work
    fn is_configured(&self) -> bool;
}

/// Create the search client from config
pub fn create_client(config: &SearchConfig) -> Result<Arc<dyn SearchClient>, SearchError> {
    debug!(base_url = %config.base_url, "create_client: called");
    Ok(Arc::new(TavilyClient::from_config(config)?))
}
