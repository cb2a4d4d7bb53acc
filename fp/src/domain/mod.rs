//! Domain types for free-time planning
//!
//! Every value here is created fresh per request and discarded with the
//! response; nothing carries identity beyond one pipeline run.

mod anchor;
mod decision;
mod payload;
mod plan;
mod time;
mod validate;

pub use anchor::{MobilityQuery, TimeAnchor};
pub use decision::{DECISION_FIELDS, MobilityDecision};
pub use plan::{PlanEvent, PlanPattern, PlanQuery, PlanSet, SHORT_ACTIVITY_THRESHOLD_MINUTES};
pub use time::parse_timestamp;
pub(crate) use time::deserialize_timestamp;
pub use validate::{PlanValidationError, TilingViolation};
