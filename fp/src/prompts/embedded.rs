//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Mobility decision prompt (transit or on foot)
pub const MOBILITY_DECISION: &str = include_str!("../../prompts/mobility-decision.pmt");

/// General planner prompt
pub const PLAN_GENERAL: &str = include_str!("../../prompts/plan-general.pmt");

/// Athletic planner prompt
pub const PLAN_ATHLETIC: &str = include_str!("../../prompts/plan-athletic.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "mobility-decision" => Some(MOBILITY_DECISION),
        "plan-general" => Some(PLAN_GENERAL),
        "plan-athletic" => Some(PLAN_ATHLETIC),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
