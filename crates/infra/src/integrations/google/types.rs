//! Google Calendar v3 wire types

use busysync_domain::utils::time::start_of_day;
use busysync_domain::{
    BusySyncError, CalendarInfo, EventStatus, NewEvent, PushChannel, RemoteEvent, Result,
    Transparency,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CalendarListResponse {
    #[serde(default)]
    pub items: Vec<CalendarListEntry>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CalendarListEntry {
    id: String,
    summary: Option<String>,
    access_role: Option<String>,
    #[serde(default)]
    primary: bool,
}

impl From<CalendarListEntry> for CalendarInfo {
    fn from(entry: CalendarListEntry) -> Self {
        Self {
            access_role: entry.access_role.unwrap_or_else(|| "unknown".into()),
            primary: entry.primary,
            ..CalendarInfo::new(entry.id, entry.summary.unwrap_or_else(|| "Unknown".into()))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventsResponse {
    #[serde(default)]
    pub items: Vec<GoogleEvent>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GoogleEvent {
    id: String,
    summary: Option<String>,
    description: Option<String>,
    start: Option<EventDateTime>,
    end: Option<EventDateTime>,
    status: Option<String>,
    transparency: Option<String>,
    #[serde(default)]
    attendees: Vec<Attendee>,
    creator: Option<Person>,
    organizer: Option<Person>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventDateTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
}

impl EventDateTime {
    /// Parse into a UTC instant. A bare `date` is midnight UTC.
    fn parse(&self) -> Result<(DateTime<Utc>, bool)> {
        if let Some(value) = &self.date_time {
            let parsed = DateTime::parse_from_rfc3339(value).map_err(|err| {
                BusySyncError::Internal(format!("invalid dateTime '{value}': {err}"))
            })?;
            return Ok((parsed.with_timezone(&Utc), false));
        }
        if let Some(value) = &self.date {
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|err| BusySyncError::Internal(format!("invalid date '{value}': {err}")))?;
            return Ok((start_of_day(date), true));
        }
        Err(BusySyncError::Internal("event time has neither dateTime nor date".into()))
    }

    fn from_instant(instant: DateTime<Utc>, all_day: bool) -> Self {
        if all_day {
            Self { date: Some(instant.date_naive().format("%Y-%m-%d").to_string()), date_time: None }
        } else {
            Self { date_time: Some(instant.to_rfc3339()), date: None }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Attendee {
    #[serde(default)]
    email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Person {
    email: Option<String>,
}

impl GoogleEvent {
    pub fn into_remote(self) -> Result<RemoteEvent> {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return Err(BusySyncError::Internal(format!("event {} has no start or end", self.id)));
        };
        let (start_time, all_day) = start.parse()?;
        let (end_time, _) = end.parse()?;

        let participants = self
            .attendees
            .into_iter()
            .filter_map(|a| {
                let email = a.email.trim().to_string();
                if email.is_empty() {
                    warn!(event_id = %self.id, "empty attendee email");
                    None
                } else {
                    Some(email)
                }
            })
            .collect();

        let mut event = RemoteEvent::new(
            self.id,
            self.summary.unwrap_or_default(),
            start_time,
            end_time,
        );
        event.description = self.description.unwrap_or_default();
        event.all_day = all_day;
        event.participants = participants;
        event.status = self.status.map(EventStatus::from).unwrap_or_default();
        event.transparency = match self.transparency.as_deref() {
            Some("transparent") => Transparency::Transparent,
            _ => Transparency::Opaque,
        };
        event.creator = self.creator.and_then(|p| p.email);
        event.organizer = self.organizer.and_then(|p| p.email);
        Ok(event)
    }
}

/// Body of `POST /calendars/{id}/events`.
#[derive(Debug, Serialize)]
pub(crate) struct EventInsert {
    summary: String,
    description: String,
    start: EventDateTime,
    end: EventDateTime,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attendees: Vec<Attendee>,
}

impl From<&NewEvent> for EventInsert {
    fn from(event: &NewEvent) -> Self {
        Self {
            summary: event.title.clone(),
            description: event.description.clone(),
            start: EventDateTime::from_instant(event.start_time, event.all_day),
            end: EventDateTime::from_instant(event.end_time, event.all_day),
            attendees: event.participants.iter().map(|email| Attendee { email: email.clone() }).collect(),
        }
    }
}

/// Body of `POST /calendars/{id}/events/watch`.
#[derive(Debug, Serialize)]
pub(crate) struct WatchRequest<'a> {
    pub id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<&'a str>,
}

/// Body of `POST /channels/stop`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StopChannelRequest<'a> {
    pub id: &'a str,
    pub resource_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChannelResponse {
    id: String,
    resource_id: String,
    resource_uri: Option<String>,
    /// Milliseconds since the epoch, as a string.
    expiration: Option<String>,
    kind: Option<String>,
}

impl ChannelResponse {
    pub fn into_channel(self, calendar_id: &str) -> PushChannel {
        let expiration = self
            .expiration
            .as_deref()
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
        PushChannel {
            channel_id: self.id,
            resource_id: self.resource_id,
            resource_uri: self.resource_uri,
            expiration,
            kind: self.kind,
            calendar_id: calendar_id.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

const fn default_expires_in() -> i64 {
    3600
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn timed_event_converts_to_utc() {
        let event: GoogleEvent = serde_json::from_value(json!({
            "id": "abc",
            "summary": "Standup",
            "start": { "dateTime": "2025-03-10T10:00:00+02:00" },
            "end": { "dateTime": "2025-03-10T10:30:00+02:00" },
            "status": "confirmed",
            "attendees": [{ "email": "a@example.com" }, { "email": " " }, { "email": "b@example.com" }]
        }))
        .unwrap();

        let remote = event.into_remote().unwrap();
        assert_eq!(remote.start_time, Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap());
        assert!(!remote.all_day);
        assert_eq!(remote.participants, vec!["a@example.com", "b@example.com"]);
        assert!(remote.status.is_confirmed());
        assert_eq!(remote.transparency, Transparency::Opaque);
    }

    #[test]
    fn date_only_event_is_all_day_and_defaults_apply() {
        let event: GoogleEvent = serde_json::from_value(json!({
            "id": "holiday",
            "start": { "date": "2025-03-10" },
            "end": { "date": "2025-03-11" },
            "transparency": "transparent"
        }))
        .unwrap();

        let remote = event.into_remote().unwrap();
        assert!(remote.all_day);
        assert_eq!(remote.start_time, Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap());
        assert_eq!(remote.status.to_string(), "unknown");
        assert_eq!(remote.transparency, Transparency::Transparent);
    }

    #[test]
    fn all_day_insert_uses_dates() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let new_event = NewEvent {
            title: "Busy".into(),
            description: "Busy block for: Offsite".into(),
            start_time: start,
            end_time: start + chrono::Duration::days(1),
            all_day: true,
            participants: Vec::new(),
        };

        let body = serde_json::to_value(EventInsert::from(&new_event)).unwrap();
        assert_eq!(body["start"], json!({ "date": "2025-03-10" }));
        assert_eq!(body["end"], json!({ "date": "2025-03-11" }));
        assert!(body.get("attendees").is_none());
    }
}
