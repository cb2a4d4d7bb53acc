//! Tiling check for generated plans
//!
//! The model is only asked to make each plan's events cover the window
//! back-to-back. This checks it mechanically.

use chrono::{DateTime, FixedOffset};
use thiserror::Error;
use tracing::debug;

use super::{MobilityQuery, PlanPattern, PlanSet};

/// One way a plan fails to tile the window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TilingViolation {
    NoEvents,
    /// Event ends before it starts
    InvertedEvent { index: usize },
    StartsBeforeDeparture { index: usize },
    EndsAfterArrival { index: usize },
    /// Unfilled time between event `after` and the next one
    Gap { after: usize, seconds: i64 },
    /// Event `after` runs into the next one
    Overlap { after: usize, seconds: i64 },
    /// The first event begins after the departure time
    FirstEventLate { seconds: i64 },
    /// The last event finishes before the arrival time
    LastEventEarly { seconds: i64 },
}

impl std::fmt::Display for TilingViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TilingViolation::NoEvents => write!(f, "plan has no events"),
            TilingViolation::InvertedEvent { index } => write!(f, "event {} ends before it starts", index),
            TilingViolation::StartsBeforeDeparture { index } => {
                write!(f, "event {} starts before the departure time", index)
            }
            TilingViolation::EndsAfterArrival { index } => write!(f, "event {} ends after the arrival time", index),
            TilingViolation::Gap { after, seconds } => {
                write!(f, "gap of {} after event {}", span(*seconds), after)
            }
            TilingViolation::Overlap { after, seconds } => {
                write!(f, "event {} overlaps the next by {}", after, span(*seconds))
            }
            TilingViolation::FirstEventLate { seconds } => {
                write!(f, "first event starts {} after departure", span(*seconds))
            }
            TilingViolation::LastEventEarly { seconds } => {
                write!(f, "last event ends {} before arrival", span(*seconds))
            }
        }
    }
}

fn span(seconds: i64) -> String {
    if seconds % 60 == 0 {
        format!("{}m", seconds / 60)
    } else {
        format!("{}s", seconds)
    }
}

fn seconds_between(earlier: DateTime<FixedOffset>, later: DateTime<FixedOffset>) -> i64 {
    (later - earlier).num_seconds()
}

/// Violations found across a plan set, keyed by plan index
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} tiling violation(s): {}", .violations.len(), summary(.violations))]
pub struct PlanValidationError {
    pub violations: Vec<(usize, TilingViolation)>,
}

fn summary(violations: &[(usize, TilingViolation)]) -> String {
    violations
        .iter()
        .map(|(plan, v)| format!("plan {}: {}", plan, v))
        .collect::<Vec<_>>()
        .join("; ")
}

impl PlanPattern {
    /// Every way this pattern fails to tile `[departure, arrival]`
    pub fn tiling_violations(&self, window: &MobilityQuery) -> Vec<TilingViolation> {
        debug!(events = self.events.len(), "PlanPattern::tiling_violations: called");
        let departure = window.departure.time;
        let arrival = window.arrival.time;

        let (Some(first), Some(last)) = (self.events.first(), self.events.last()) else {
            return vec![TilingViolation::NoEvents];
        };

        let mut violations = Vec::new();

        for (index, event) in self.events.iter().enumerate() {
            if event.end_time < event.start_time {
                violations.push(TilingViolation::InvertedEvent { index });
            }
            if event.start_time < departure {
                violations.push(TilingViolation::StartsBeforeDeparture { index });
            }
            if event.end_time > arrival {
                violations.push(TilingViolation::EndsAfterArrival { index });
            }
        }

        for (after, pair) in self.events.windows(2).enumerate() {
            let (current, next) = (&pair[0], &pair[1]);
            if next.start_time > current.end_time {
                violations.push(TilingViolation::Gap {
                    after,
                    seconds: seconds_between(current.end_time, next.start_time),
                });
            } else if next.start_time < current.end_time {
                violations.push(TilingViolation::Overlap {
                    after,
                    seconds: seconds_between(next.start_time, current.end_time),
                });
            }
        }

        if first.start_time > departure {
            violations.push(TilingViolation::FirstEventLate {
                seconds: seconds_between(departure, first.start_time),
            });
        }
        if last.end_time < arrival {
            violations.push(TilingViolation::LastEventEarly {
                seconds: seconds_between(last.end_time, arrival),
            });
        }

        violations
    }
}

impl PlanSet {
    /// Pass/fail check that every plan exactly tiles the query window
    pub fn validate(&self, window: &MobilityQuery) -> Result<(), PlanValidationError> {
        debug!(plans = self.plans.len(), "PlanSet::validate: called");
        let violations: Vec<_> = self
            .plans
            .iter()
            .enumerate()
            .flat_map(|(idx, plan)| plan.tiling_violations(window).into_iter().map(move |v| (idx, v)))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(PlanValidationError { violations })
        }
    }
}
