//! Calendar boundary
//!
//! The planner never reads calendar storage itself. The command line uses
//! [`resolve_window`] to turn a free-time range into a [`MobilityQuery`] by
//! looking up the commitments on either side of it.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{MobilityQuery, TimeAnchor, deserialize_timestamp};
use crate::query::Locale;

/// A stored calendar commitment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub start_time: DateTime<FixedOffset>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub end_time: DateTime<FixedOffset>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Failed to read calendar file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse calendar: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Lookups the planner's callers need from calendar storage
#[async_trait]
pub trait CalendarLookup: Send + Sync {
    /// Latest event whose end is at or before `time`
    async fn event_ending_before(&self, time: DateTime<FixedOffset>) -> Result<Option<CalendarEvent>, CalendarError>;

    /// Earliest event whose start is at or after `time`
    async fn event_starting_after(&self, time: DateTime<FixedOffset>) -> Result<Option<CalendarEvent>, CalendarError>;
}

/// Calendar held in memory, loaded from a YAML list of events
#[derive(Debug, Clone, Default)]
pub struct InMemoryCalendar {
    events: Vec<CalendarEvent>,
}

impl InMemoryCalendar {
    pub fn new(events: Vec<CalendarEvent>) -> Self {
        debug!(event_count = events.len(), "InMemoryCalendar::new: called");
        Self { events }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, CalendarError> {
        debug!(yaml_len = yaml.len(), "InMemoryCalendar::from_yaml_str: called");
        let events: Vec<CalendarEvent> = serde_yaml::from_str(yaml)?;
        Ok(Self::new(events))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CalendarError> {
        let path = path.as_ref();
        debug!(?path, "InMemoryCalendar::load: called");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }
}

#[async_trait]
impl CalendarLookup for InMemoryCalendar {
    async fn event_ending_before(&self, time: DateTime<FixedOffset>) -> Result<Option<CalendarEvent>, CalendarError> {
        debug!(%time, "InMemoryCalendar::event_ending_before: called");
        Ok(self
            .events
            .iter()
            .filter(|e| e.end_time <= time)
            .max_by_key(|e| e.end_time)
            .cloned())
    }

    async fn event_starting_after(&self, time: DateTime<FixedOffset>) -> Result<Option<CalendarEvent>, CalendarError> {
        debug!(%time, "InMemoryCalendar::event_starting_after: called");
        Ok(self
            .events
            .iter()
            .filter(|e| e.start_time >= time)
            .min_by_key(|e| e.start_time)
            .cloned())
    }
}

fn fallback_places(locale: Locale) -> (&'static str, &'static str) {
    match locale {
        Locale::En => ("current location", "destination"),
        Locale::Ja => ("現在地", "目的地"),
    }
}

/// Build the planning window around a free-time range
///
/// The previous commitment's end and location become the departure anchor,
/// the next commitment's start and location the arrival anchor. Missing
/// events fall back to the range bounds and placeholder place names.
pub async fn resolve_window(
    calendar: &dyn CalendarLookup,
    free_start: DateTime<FixedOffset>,
    free_end: DateTime<FixedOffset>,
    preference: impl Into<String>,
    locale: Locale,
) -> Result<MobilityQuery, CalendarError> {
    debug!(%free_start, %free_end, "resolve_window: called");
    let (here, there) = fallback_places(locale);

    let departure = match calendar.event_ending_before(free_start).await? {
        Some(prev) => {
            debug!(title = %prev.title, "resolve_window: found previous event");
            TimeAnchor::new(prev.location.unwrap_or_else(|| here.to_string()), prev.end_time)
        }
        None => TimeAnchor::new(here, free_start),
    };

    let arrival = match calendar.event_starting_after(free_end).await? {
        Some(next) => {
            debug!(title = %next.title, "resolve_window: found next event");
            TimeAnchor::new(next.location.unwrap_or_else(|| there.to_string()), next.start_time)
        }
        None => TimeAnchor::new(there, free_end),
    };

    Ok(MobilityQuery::new(departure, arrival, preference))
}
