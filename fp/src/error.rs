//! Planner error taxonomy
//!
//! Every stage failure is one of five kinds. Search failures are absorbed
//! inside a stage; everything else propagates unchanged to the caller, which
//! uses [`PlannerError::class`] to pick a response class.

use thiserror::Error;
use tracing::debug;

use crate::llm::LlmError;
use crate::search::SearchError;

/// Which pipeline stage produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    MobilityDecision,
    PlanGeneration,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::MobilityDecision => write!(f, "mobility decision"),
            Stage::PlanGeneration => write!(f, "plan generation"),
        }
    }
}

/// Errors surfaced by the planning pipeline
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Missing credentials or a broken prompt template
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The request itself cannot be planned (e.g. empty time window)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Web search failed; stages downgrade this to an empty context
    #[error("Search provider error: {0}")]
    SearchProvider(#[from] SearchError),

    /// The reasoning provider answered, but not with the agreed JSON contract
    #[error("Malformed {stage} response: {reason}")]
    MalformedResponse { stage: Stage, reason: String },

    /// Transport or auth failure talking to the reasoning provider
    #[error("Reasoning provider error: {0}")]
    ReasoningProvider(#[source] LlmError),
}

/// Response class the excluded HTTP layer maps each error onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    ServiceUnavailable,
    BadRequest,
    UpstreamFailure,
}

impl ErrorClass {
    /// HTTP status code conventionally used for this class
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorClass::ServiceUnavailable => 503,
            ErrorClass::BadRequest => 400,
            ErrorClass::UpstreamFailure => 502,
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::ServiceUnavailable => write!(f, "service unavailable"),
            ErrorClass::BadRequest => write!(f, "bad request"),
            ErrorClass::UpstreamFailure => write!(f, "upstream failure"),
        }
    }
}

impl PlannerError {
    /// Build a malformed-response error for a stage
    pub fn malformed(stage: Stage, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        debug!(%stage, %reason, "PlannerError::malformed: called");
        PlannerError::MalformedResponse { stage, reason }
    }

    /// Classify this error for the caller
    pub fn class(&self) -> ErrorClass {
        match self {
            PlannerError::Configuration(_) => ErrorClass::ServiceUnavailable,
            PlannerError::InvalidRequest(_) => ErrorClass::BadRequest,
            PlannerError::SearchProvider(_) => ErrorClass::UpstreamFailure,
            PlannerError::MalformedResponse { .. } => ErrorClass::UpstreamFailure,
            PlannerError::ReasoningProvider(_) => ErrorClass::UpstreamFailure,
        }
    }

    /// Convert a reasoning client failure, keeping empty content distinct from transport failure
    pub fn from_llm(stage: Stage, err: LlmError) -> Self {
        debug!(%stage, error = %err, "PlannerError::from_llm: called");
        match err {
            LlmError::EmptyResponse => {
                debug!("PlannerError::from_llm: empty response is malformed, not transport");
                PlannerError::malformed(stage, "reasoning provider returned no content")
            }
            other => PlannerError::ReasoningProvider(other),
        }
    }
}
