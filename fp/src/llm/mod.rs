//! LLM Client module
//!
//! The reasoning-provider boundary: a stateless completion trait plus the
//! OpenAI Chat Completions implementation used in production.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};

use crate::config::LlmConfig;

/// Create the reasoning client from config
///
/// A missing API key does not fail here; the client reports itself as
/// unconfigured and the first stage that needs it raises the error.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(model = %config.model, base_url = %config.base_url, "create_client: called");
    Ok(Arc::new(OpenAIClient::from_config(config)?))
}
