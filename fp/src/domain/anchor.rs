//! Time anchors and the mobility query they bound

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PlannerError;

/// A point in time at a named place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAnchor {
    pub place: String,
    pub time: DateTime<FixedOffset>,
}

impl TimeAnchor {
    pub fn new(place: impl Into<String>, time: DateTime<FixedOffset>) -> Self {
        Self {
            place: place.into(),
            time,
        }
    }
}

/// A free-time window between two commitments, plus what the user wants from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobilityQuery {
    /// Where and when the previous commitment ends
    pub departure: TimeAnchor,
    /// Where and when the next commitment starts
    pub arrival: TimeAnchor,
    /// Free-text preference, e.g. "minimize cost"
    pub preference: String,
}

impl MobilityQuery {
    pub fn new(departure: TimeAnchor, arrival: TimeAnchor, preference: impl Into<String>) -> Self {
        Self {
            departure,
            arrival,
            preference: preference.into(),
        }
    }

    /// Check the window can be planned at all
    pub fn validate(&self) -> Result<(), PlannerError> {
        debug!(departure = %self.departure.time, arrival = %self.arrival.time, "MobilityQuery::validate: called");
        if self.departure.time >= self.arrival.time {
            return Err(PlannerError::InvalidRequest(format!(
                "departure ({}) must be before arrival ({})",
                self.departure.time.to_rfc3339(),
                self.arrival.time.to_rfc3339()
            )));
        }
        if self.departure.place.trim().is_empty() || self.arrival.place.trim().is_empty() {
            return Err(PlannerError::InvalidRequest(
                "departure and arrival places must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Total budget in whole minutes, never negative
    pub fn available_minutes(&self) -> i64 {
        (self.arrival.time - self.departure.time).num_minutes().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parse_timestamp;

    fn query(depart: &str, arrive: &str) -> MobilityQuery {
        MobilityQuery::new(
            TimeAnchor::new("Station A", parse_timestamp(depart).unwrap()),
            TimeAnchor::new("Station B", parse_timestamp(arrive).unwrap()),
            "minimize cost",
        )
    }

    #[test]
    fn test_available_minutes_whole_minutes() {
        let q = query("2025-06-01T10:00:00+09:00", "2025-06-01T11:30:00+09:00");
        assert_eq!(q.available_minutes(), 90);

        // Partial minutes truncate
        let q = query("2025-06-01T10:00:00+09:00", "2025-06-01T10:45:59+09:00");
        assert_eq!(q.available_minutes(), 45);
    }

    #[test]
    fn test_available_minutes_across_offsets() {
        let q = query("2025-06-01T10:00:00+09:00", "2025-06-01T02:00:00+00:00");
        assert_eq!(q.available_minutes(), 60);
    }

    #[test]
    fn test_available_minutes_never_negative() {
        let q = query("2025-06-01T12:00:00Z", "2025-06-01T10:00:00Z");
        assert_eq!(q.available_minutes(), 0);
    }

    #[test]
    fn test_validate_window() {
        assert!(query("2025-06-01T10:00:00Z", "2025-06-01T10:01:00Z").validate().is_ok());
        assert!(matches!(
            query("2025-06-01T10:00:00Z", "2025-06-01T10:00:00Z").validate(),
            Err(PlannerError::InvalidRequest(_))
        ));
        assert!(matches!(
            query("2025-06-01T11:00:00Z", "2025-06-01T10:00:00Z").validate(),
            Err(PlannerError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_validate_places() {
        let mut q = query("2025-06-01T10:00:00Z", "2025-06-01T11:00:00Z");
        q.arrival.place = "  ".to_string();
        assert!(matches!(q.validate(), Err(PlannerError::InvalidRequest(_))));
    }
}
