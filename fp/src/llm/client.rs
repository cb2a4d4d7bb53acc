//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is independent (fresh context)
///
/// This is the reasoning-provider boundary of the planner. Implementations
/// must be reentrant: concurrent pipeline runs share one client.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Whether credentials are present; stages check this before any work
    fn is_configured(&self) -> bool;
}
