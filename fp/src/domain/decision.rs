//! Mobility decision - transit or on foot, and what it costs in time and money

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::payload::parse_object;
use crate::error::{PlannerError, Stage};

/// Field names the reasoning provider must return, in prompt order
pub const DECISION_FIELDS: &[&str] = &[
    "use_public_transport",
    "recommended_mode",
    "reasoning",
    "estimated_time",
    "estimated_cost",
];

/// How the gap between the two anchors should be bridged
///
/// Serialized with the same field names the reasoning provider uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobilityDecision {
    pub use_public_transport: bool,
    pub recommended_mode: String,
    pub reasoning: String,
    /// Travel minutes for the recommended mode
    #[serde(rename = "estimated_time")]
    pub estimated_minutes: u32,
    pub estimated_cost: String,
}

impl MobilityDecision {
    /// Parse the decision stage's completion text
    ///
    /// All five fields are required; values are copied verbatim. A negative or
    /// fractional `estimated_time` fails type parsing.
    pub fn from_completion(text: &str) -> Result<Self, PlannerError> {
        debug!(text_len = text.len(), "MobilityDecision::from_completion: called");
        let object = parse_object(text).map_err(|e| PlannerError::malformed(Stage::MobilityDecision, e))?;

        if let Some(missing) = DECISION_FIELDS.iter().find(|f| !object.contains_key(**f)) {
            debug!(%missing, "MobilityDecision::from_completion: required field absent");
            return Err(PlannerError::malformed(
                Stage::MobilityDecision,
                format!("missing required field `{}`", missing),
            ));
        }

        serde_json::from_value(serde_json::Value::Object(object))
            .map_err(|e| PlannerError::malformed(Stage::MobilityDecision, e.to_string()))
    }

    /// Whether the estimate exceeds the whole window
    pub fn exceeds_budget(&self, available_minutes: i64) -> bool {
        i64::from(self.estimated_minutes) > available_minutes
    }
}
