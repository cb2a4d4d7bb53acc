//! LLM request/response types
//!
//! Modeled on the Chat Completions API, trimmed to what the planner needs:
//! a single system instruction and a JSON-object mode.

use tracing::debug;

use super::LlmError;

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt (rendered from a Handlebars template)
    pub system_prompt: String,

    /// Max tokens for response (capped by config)
    pub max_tokens: u32,

    /// Constrain the completion to a single JSON object
    pub json_mode: bool,
}

impl CompletionRequest {
    /// A system-prompt-only request constrained to JSON-object output
    pub fn json(system_prompt: impl Into<String>, max_tokens: u32) -> Self {
        let system_prompt = system_prompt.into();
        debug!(prompt_len = system_prompt.len(), %max_tokens, "CompletionRequest::json: called");
        Self {
            system_prompt,
            max_tokens,
            json_mode: true,
        }
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content (None when the provider sent null)
    pub content: Option<String>,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// A finished response carrying text content
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    /// Take the text content, treating null or blank content as a failure
    pub fn into_text(self) -> Result<String, LlmError> {
        debug!(stop_reason = ?self.stop_reason, "CompletionResponse::into_text: called");
        match self.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => {
                debug!("CompletionResponse::into_text: no usable content");
                Err(LlmError::EmptyResponse)
            }
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    ContentFilter,
}

impl StopReason {
    /// Parse from an OpenAI finish_reason string
    pub fn from_openai(s: Option<&str>) -> Self {
        debug!(?s, "StopReason::from_openai: called");
        match s {
            Some("length") => StopReason::MaxTokens,
            Some("content_filter") => StopReason::ContentFilter,
            _ => StopReason::EndTurn,
        }
    }
}

/// Token usage for cost tracking
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_request() {
        let req = CompletionRequest::json("decide", 512);
        assert!(req.json_mode);
        assert_eq!(req.system_prompt, "decide");
        assert_eq!(req.max_tokens, 512);
    }

    #[test]
    fn test_into_text_rejects_null_and_blank() {
        let null = CompletionResponse {
            content: None,
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        };
        assert!(matches!(null.into_text(), Err(LlmError::EmptyResponse)));
        assert!(matches!(
            CompletionResponse::text("   \n").into_text(),
            Err(LlmError::EmptyResponse)
        ));
        assert_eq!(CompletionResponse::text("{}").into_text().unwrap(), "{}");
    }

    #[test]
    fn test_stop_reason_from_openai() {
        assert_eq!(StopReason::from_openai(Some("stop")), StopReason::EndTurn);
        assert_eq!(StopReason::from_openai(Some("length")), StopReason::MaxTokens);
        assert_eq!(StopReason::from_openai(Some("content_filter")), StopReason::ContentFilter);
        assert_eq!(StopReason::from_openai(None), StopReason::EndTurn);
    }
}
