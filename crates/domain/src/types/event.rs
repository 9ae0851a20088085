//! Calendar events as fetched from a calendar backend

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MIN_PARTICIPANTS;
use crate::errors::{BusySyncError, Result};
use crate::impl_domain_status_conversions;

/// Event lifecycle status. Unrecognised backend values are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
    Other(String),
}

impl EventStatus {
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl Default for EventStatus {
    fn default() -> Self {
        Self::Other("unknown".into())
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirmed => f.write_str("confirmed"),
            Self::Tentative => f.write_str("tentative"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Other(value) => f.write_str(value),
        }
    }
}

impl FromStr for EventStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Ok(match normalized.as_str() {
            "confirmed" => Self::Confirmed,
            "tentative" => Self::Tentative,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(normalized),
        })
    }
}

impl From<String> for EventStatus {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl From<EventStatus> for String {
    fn from(value: EventStatus) -> Self {
        value.to_string()
    }
}

/// Whether an event blocks time (`opaque`) or shows the attendee as free.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transparency {
    #[default]
    Opaque,
    Transparent,
}

impl_domain_status_conversions!(Transparency {
    Opaque => "opaque",
    Transparent => "transparent",
});

/// An event as returned by a calendar client, before it is tied to the
/// account and calendar it was fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub transparency: Transparency,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub organizer: Option<String>,
}

impl RemoteEvent {
    /// A confirmed, opaque timed event with no participants.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            start_time,
            end_time,
            all_day: false,
            participants: Vec::new(),
            status: EventStatus::Confirmed,
            transparency: Transparency::Opaque,
            creator: None,
            organizer: None,
        }
    }
}

/// A source event tied to the account and calendar it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub calendar_id: String,
    pub account_id: u32,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub all_day: bool,
    pub participants: Vec<String>,
    /// Explicit count from the backend; falls back to `participants.len()`.
    participant_count: Option<usize>,
    pub status: EventStatus,
    pub transparency: Transparency,
    pub creator: Option<String>,
    pub organizer: Option<String>,
}

impl CalendarEvent {
    /// Create a new confirmed, opaque event. `end_time` may not precede
    /// `start_time`.
    pub fn new(
        id: impl Into<String>,
        calendar_id: impl Into<String>,
        account_id: u32,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Self> {
        let id = id.into();
        if end_time < start_time {
            return Err(BusySyncError::InvalidInput(format!(
                "event {id} ends ({end_time}) before it starts ({start_time})"
            )));
        }
        Ok(Self {
            id,
            calendar_id: calendar_id.into(),
            account_id,
            title: title.into(),
            description: String::new(),
            start_time,
            end_time,
            all_day: false,
            participants: Vec::new(),
            participant_count: None,
            status: EventStatus::Confirmed,
            transparency: Transparency::Opaque,
            creator: None,
            organizer: None,
        })
    }

    /// Tie a fetched event to its source calendar.
    pub fn from_remote(remote: RemoteEvent, calendar_id: &str, account_id: u32) -> Result<Self> {
        let mut event = Self::new(
            remote.id,
            calendar_id,
            account_id,
            remote.title,
            remote.start_time,
            remote.end_time,
        )?;
        event.description = remote.description;
        event.all_day = remote.all_day;
        event.participants = remote.participants;
        event.status = remote.status;
        event.transparency = remote.transparency;
        event.creator = remote.creator;
        event.organizer = remote.organizer;
        Ok(event)
    }

    #[must_use]
    pub fn with_participants<I, S>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participants = participants.into_iter().map(Into::into).collect();
        self
    }

    /// Override the participant count reported by the backend.
    #[must_use]
    pub fn with_participant_count(mut self, count: usize) -> Self {
        self.participant_count = Some(count);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_transparency(mut self, transparency: Transparency) -> Self {
        self.transparency = transparency;
        self
    }

    #[must_use]
    pub fn all_day(mut self) -> Self {
        self.all_day = true;
        self
    }

    pub fn participant_count(&self) -> usize {
        match self.participant_count {
            Some(count) if count > 0 => count,
            _ => self.participants.len(),
        }
    }

    pub fn has_multiple_participants(&self) -> bool {
        self.participant_count() >= MIN_PARTICIPANTS
    }

    pub const fn is_transparent(&self) -> bool {
        matches!(self.transparency, Transparency::Transparent)
    }

    /// At least two participants and confirmed. Transparency is judged
    /// separately.
    pub fn meets_criteria(&self) -> bool {
        self.has_multiple_participants() && self.status.is_confirmed()
    }
}

/// Payload for creating an event on a target calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub all_day: bool,
    #[serde(default)]
    pub participants: Vec<String>,
}

/// Metadata for a registered push-notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushChannel {
    pub channel_id: String,
    pub resource_id: String,
    pub resource_uri: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
    pub kind: Option<String>,
    pub calendar_id: String,
}
