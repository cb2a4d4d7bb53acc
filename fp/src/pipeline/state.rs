//! Per-run pipeline state
//!
//! `Start -> [DecisionInFlight ->] DecisionDone -> PlanSearchInFlight ->
//! PlanReasoningInFlight -> Done`, with `Failed` reachable from any
//! non-terminal state. Nothing here outlives one run.

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

/// Where a pipeline run currently is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "kebab-case")]
pub enum PipelineState {
    Start,
    DecisionInFlight,
    DecisionDone,
    PlanSearchInFlight,
    PlanReasoningInFlight,
    Done,
    Failed(String),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }

    /// Whether `next` may directly follow this state
    pub fn can_transition_to(&self, next: &PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (current, Failed(_)) => !current.is_terminal(),
            (Start, DecisionInFlight) | (Start, DecisionDone) => true,
            (DecisionInFlight, DecisionDone) => true,
            (DecisionDone, PlanSearchInFlight) => true,
            (PlanSearchInFlight, PlanReasoningInFlight) => true,
            (PlanReasoningInFlight, Done) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Start => write!(f, "start"),
            PipelineState::DecisionInFlight => write!(f, "decision-in-flight"),
            PipelineState::DecisionDone => write!(f, "decision-done"),
            PipelineState::PlanSearchInFlight => write!(f, "plan-search-in-flight"),
            PipelineState::PlanReasoningInFlight => write!(f, "plan-reasoning-in-flight"),
            PipelineState::Done => write!(f, "done"),
            PipelineState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// One pipeline run: an id for log correlation and the states visited
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    id: Uuid,
    history: Vec<PipelineState>,
}

impl PipelineRun {
    pub fn new() -> Self {
        let id = Uuid::now_v7();
        debug!(%id, "PipelineRun::new: called");
        Self {
            id,
            history: vec![PipelineState::Start],
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &PipelineState {
        // history always starts with Start
        self.history.last().unwrap_or(&PipelineState::Start)
    }

    /// States visited so far, in order
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// Move to `next`; an illegal transition is logged and ignored
    pub(crate) fn advance(&mut self, next: PipelineState) -> bool {
        debug!(run_id = %self.id, from = %self.state(), to = %next, "PipelineRun::advance: called");
        if !self.state().can_transition_to(&next) {
            warn!(run_id = %self.id, from = %self.state(), to = %next, "Ignoring illegal pipeline transition");
            return false;
        }
        self.history.push(next);
        true
    }

    pub(crate) fn fail(&mut self, reason: impl Into<String>) -> bool {
        self.advance(PipelineState::Failed(reason.into()))
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}
