//! Plans - alternative sequences of time-boxed events filling the window

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::payload::parse_object;
use super::time::deserialize_timestamp;
use super::{MobilityDecision, MobilityQuery};
use crate::error::{PlannerError, Stage};

/// Below this many free minutes only a short nearby activity is searched for
pub const SHORT_ACTIVITY_THRESHOLD_MINUTES: i64 = 15;

/// Input to plan generation: the window plus a real or synthesized decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanQuery {
    pub mobility: MobilityQuery,
    pub decision: MobilityDecision,
}

impl PlanQuery {
    pub fn new(mobility: MobilityQuery, decision: MobilityDecision) -> Self {
        Self { mobility, decision }
    }

    pub fn available_minutes(&self) -> i64 {
        self.mobility.available_minutes()
    }

    /// Minutes left for the activity once travel is paid for, saturating at zero
    pub fn net_activity_minutes(&self) -> i64 {
        (self.available_minutes() - i64::from(self.decision.estimated_minutes)).max(0)
    }

    pub fn is_short_window(&self) -> bool {
        self.net_activity_minutes() < SHORT_ACTIVITY_THRESHOLD_MINUTES
    }
}

/// One time-boxed step of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEvent {
    pub title: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub start_time: DateTime<FixedOffset>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub end_time: DateTime<FixedOffset>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One alternative plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPattern {
    #[serde(rename = "pattern_description")]
    pub description: String,
    pub events: Vec<PlanEvent>,
}

/// What the caller gets back: the decision used, and the alternatives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSet {
    #[serde(rename = "mobility_decision")]
    pub decision: MobilityDecision,
    pub plans: Vec<PlanPattern>,
}

impl PlanSet {
    /// Parse the plan stage's completion text into patterns
    ///
    /// Requires a top-level `plans` array; every element must map onto a
    /// [`PlanPattern`] or the whole response is rejected.
    pub fn parse_patterns(text: &str) -> Result<Vec<PlanPattern>, PlannerError> {
        debug!(text_len = text.len(), "PlanSet::parse_patterns: called");
        let mut object = parse_object(text).map_err(|e| PlannerError::malformed(Stage::PlanGeneration, e))?;

        let plans = match object.remove("plans") {
            Some(serde_json::Value::Array(items)) => items,
            Some(_) => {
                return Err(PlannerError::malformed(Stage::PlanGeneration, "`plans` is not an array"));
            }
            None => {
                debug!("PlanSet::parse_patterns: no plans key");
                return Err(PlannerError::malformed(
                    Stage::PlanGeneration,
                    "missing required field `plans`",
                ));
            }
        };

        plans
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                serde_json::from_value::<PlanPattern>(item)
                    .map_err(|e| PlannerError::malformed(Stage::PlanGeneration, format!("plans[{}]: {}", idx, e)))
            })
            .collect()
    }
}
