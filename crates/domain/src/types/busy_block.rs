//! Busy blocks derived from a source event and a sync flow

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::BUSY_BLOCK_TITLE;
use crate::errors::{BusySyncError, Result};
use crate::types::{CalendarEvent, NewEvent, RemoteEvent, SyncFlow};
use crate::utils::time::truncate_to_minute;

/// A placeholder event on a target calendar. Never persisted: its
/// existence is rediscovered from the target calendar on every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyBlock {
    pub target_account_id: u32,
    pub target_calendar_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: String,
    pub all_day: bool,
}

impl BusyBlock {
    /// Create a busy block. `end_time` must be strictly after `start_time`.
    pub fn new(
        target_account_id: u32,
        target_calendar_id: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        all_day: bool,
    ) -> Result<Self> {
        if end_time <= start_time {
            return Err(BusySyncError::InvalidInput(format!(
                "busy block end ({end_time}) must be after start ({start_time})"
            )));
        }
        Ok(Self {
            target_account_id,
            target_calendar_id: target_calendar_id.into(),
            start_time,
            end_time,
            title: BUSY_BLOCK_TITLE.to_string(),
            all_day,
        })
    }

    /// Compute the block a flow implies for an event.
    ///
    /// All-day bounds pass through verbatim. Timed bounds are truncated to
    /// the minute and then shifted by the flow offsets.
    pub fn from_event_and_flow(event: &CalendarEvent, flow: &SyncFlow) -> Result<Self> {
        let (start, end) = if event.all_day {
            (event.start_time, event.end_time)
        } else {
            (
                shift_minutes(truncate_to_minute(event.start_time), flow.start_offset_minutes)?,
                shift_minutes(truncate_to_minute(event.end_time), flow.end_offset_minutes)?,
            )
        };
        Self::new(flow.target_account_id, flow.target_calendar_id.clone(), start, end, event.all_day)
    }

    /// Whether `candidate` has this block's title, ignoring case.
    pub fn title_matches(&self, candidate: &RemoteEvent) -> bool {
        candidate.title.eq_ignore_ascii_case(&self.title)
    }

    /// Whether `candidate` is a timed busy event that fully contains this
    /// block. All-day and cancelled candidates never count as coverage.
    pub fn is_covered_by(&self, candidate: &RemoteEvent) -> bool {
        !candidate.all_day
            && !candidate.status.is_cancelled()
            && self.title_matches(candidate)
            && truncate_to_minute(candidate.start_time) <= truncate_to_minute(self.start_time)
            && truncate_to_minute(candidate.end_time) >= truncate_to_minute(self.end_time)
    }

    /// Creation payload referencing the source event.
    pub fn to_new_event(&self, source_title: &str) -> NewEvent {
        NewEvent {
            title: self.title.clone(),
            description: format!("Busy block for: {source_title}"),
            start_time: self.start_time,
            end_time: self.end_time,
            all_day: self.all_day,
            participants: Vec::new(),
        }
    }
}

fn shift_minutes(instant: DateTime<Utc>, minutes: i64) -> Result<DateTime<Utc>> {
    TimeDelta::try_minutes(minutes)
        .and_then(|delta| instant.checked_add_signed(delta))
        .ok_or_else(|| {
            BusySyncError::InvalidInput(format!("offset of {minutes} minutes from {instant} is out of range"))
        })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::types::EventStatus;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn flow() -> SyncFlow {
        SyncFlow::new("work", (1, "a"), (2, "b")).with_offsets(-15, 15)
    }

    #[test]
    fn timed_event_gets_offsets() {
        let event = CalendarEvent::new("e1", "a", 1, "Standup", at(10, 30), at(11, 30)).unwrap();
        let block = BusyBlock::from_event_and_flow(&event, &flow()).unwrap();
        assert_eq!(block.start_time, at(10, 15));
        assert_eq!(block.end_time, at(11, 45));
        assert_eq!(block.title, "Busy");
        assert_eq!(block.target_account_id, 2);
        assert_eq!(block.target_calendar_id, "b");
    }

    #[test]
    fn seconds_are_truncated_before_offsets() {
        let start = at(10, 30) + Duration::seconds(42);
        let end = at(11, 30) + Duration::seconds(7);
        let event = CalendarEvent::new("e1", "a", 1, "x", start, end).unwrap();
        let block = BusyBlock::from_event_and_flow(&event, &flow()).unwrap();
        assert_eq!(block.start_time, at(10, 15));
        assert_eq!(block.end_time, at(11, 45));
    }

    #[test]
    fn all_day_event_passes_through() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap();
        let event = CalendarEvent::new("e1", "a", 1, "Offsite", start, end).unwrap().all_day();
        let block = BusyBlock::from_event_and_flow(&event, &flow()).unwrap();
        assert_eq!((block.start_time, block.end_time), (start, end));
        assert!(block.all_day);
    }

    #[test]
    fn out_of_range_offset_is_an_error() {
        let event = CalendarEvent::new("e1", "a", 1, "x", at(10, 0), at(11, 0)).unwrap();
        let flow = SyncFlow::new("huge", (1, "a"), (2, "b")).with_offsets(-200_000_000_000, 0);

        let err = BusyBlock::from_event_and_flow(&event, &flow).unwrap_err();
        assert!(matches!(err, BusySyncError::InvalidInput(msg) if msg.contains("out of range")));
    }

    #[test]
    fn zero_length_block_is_rejected() {
        let event = CalendarEvent::new("e1", "a", 1, "x", at(10, 0), at(10, 0)).unwrap();
        let flow = SyncFlow::new("none", (1, "a"), (2, "b"));
        assert!(BusyBlock::from_event_and_flow(&event, &flow).is_err());
    }

    #[test]
    fn coverage_ignores_all_day_and_partial_overlap() {
        let block = BusyBlock::new(2, "b", at(10, 0), at(11, 0), false).unwrap();

        let wider = RemoteEvent::new("w", "BUSY", at(9, 0), at(12, 0));
        assert!(block.is_covered_by(&wider));

        let mut all_day = RemoteEvent::new(
            "d",
            "Busy",
            Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap(),
        );
        all_day.all_day = true;
        assert!(!block.is_covered_by(&all_day));

        let partial = RemoteEvent::new("p", "Busy", at(10, 30), at(12, 0));
        assert!(!block.is_covered_by(&partial));

        let other_title = RemoteEvent::new("o", "Lunch", at(9, 0), at(12, 0));
        assert!(!block.is_covered_by(&other_title));

        let mut cancelled = RemoteEvent::new("c", "Busy", at(9, 0), at(12, 0));
        cancelled.status = EventStatus::Cancelled;
        assert!(!block.is_covered_by(&cancelled));
    }

    #[test]
    fn description_references_source() {
        let block = BusyBlock::new(2, "b", at(10, 0), at(11, 0), false).unwrap();
        assert_eq!(block.to_new_event("Planning").description, "Busy block for: Planning");
    }
}
