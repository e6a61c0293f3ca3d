//! Request validation, event construction, and auto follow-up rules for reservation timelines.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::domain::{
    EventCategory, EventId, EventVisibility, ReservationId, ReservationStatus, TimelineEvent,
    TimelineEventType,
};
use crate::accounts::UserId;
use crate::clock::time_ago;
use crate::error::FieldIssue;

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;
pub const DOCUMENTATION_FOLLOW_UP_DAYS: i64 = 7;
pub const EXPIRY_REMINDER_DAYS: i64 = 25;
const NEW_STATUS_KEY: &str = "newStatus";

/// Raw `POST` body. Fields stay loosely typed so every problem can be reported per field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEventRequest {
    pub event_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<Value>,
    pub visibility: Option<String>,
    pub related_document_id: Option<String>,
    pub scheduled_date: Option<String>,
}

/// Validated event payload ready to be stamped and appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTimelineEvent {
    pub event_type: TimelineEventType,
    pub title: String,
    pub description: Option<String>,
    pub metadata: Map<String, Value>,
    pub visibility: EventVisibility,
    pub related_document_id: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
}

impl NewTimelineEvent {
    pub fn new(event_type: TimelineEventType, title: impl Into<String>) -> Self {
        Self {
            event_type,
            title: title.into(),
            description: None,
            metadata: Map::new(),
            visibility: EventVisibility::Public,
            related_document_id: None,
            scheduled_date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_visibility(mut self, visibility: EventVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn scheduled_for(mut self, when: DateTime<Utc>) -> Self {
        self.scheduled_date = Some(when);
        self
    }

    /// Check limits that typed construction cannot express.
    pub fn validate(&self) -> Result<(), Vec<FieldIssue>> {
        let mut issues = Vec::new();
        let title_len = self.title.trim().chars().count();
        if title_len == 0 {
            issues.push(FieldIssue::new("title", "title is required"));
        } else if title_len > TITLE_MAX_CHARS {
            issues.push(FieldIssue::new(
                "title",
                format!("title must be at most {TITLE_MAX_CHARS} characters"),
            ));
        }
        if self
            .description
            .as_ref()
            .is_some_and(|text| text.chars().count() > DESCRIPTION_MAX_CHARS)
        {
            issues.push(FieldIssue::new(
                "description",
                format!("description must be at most {DESCRIPTION_MAX_CHARS} characters"),
            ));
        }

        if self.event_type == TimelineEventType::StatusChange
            && self.metadata.contains_key(NEW_STATUS_KEY)
            && self.requested_status().is_none()
        {
            issues.push(FieldIssue::new(
                "metadata.newStatus",
                "newStatus must be a reservation status",
            ));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    /// Status transition carried by a `STATUS_CHANGE` event.
    pub fn requested_status(&self) -> Option<ReservationStatus> {
        if self.event_type != TimelineEventType::StatusChange {
            return None;
        }
        self.metadata
            .get(NEW_STATUS_KEY)
            .and_then(Value::as_str)
            .and_then(ReservationStatus::parse)
    }

    /// Stamp the payload into an immutable timeline row.
    pub fn into_event(
        self,
        id: EventId,
        reservation_id: ReservationId,
        event_date: DateTime<Utc>,
        created_by: Option<UserId>,
    ) -> TimelineEvent {
        TimelineEvent {
            id,
            reservation_id,
            event_type: self.event_type,
            title: self.title.trim().to_string(),
            description: self.description,
            event_date,
            scheduled_date: self.scheduled_date,
            visibility: self.visibility,
            metadata: self.metadata,
            related_document_id: self.related_document_id,
            created_by,
        }
    }
}

fn parse_visibility(value: &str) -> Option<EventVisibility> {
    match value.trim().to_ascii_uppercase().as_str() {
        "PUBLIC" => Some(EventVisibility::Public),
        "INTERNAL" => Some(EventVisibility::Internal),
        "BUYER_ONLY" => Some(EventVisibility::BuyerOnly),
        _ => None,
    }
}

impl TryFrom<TimelineEventRequest> for NewTimelineEvent {
    type Error = Vec<FieldIssue>;

    fn try_from(request: TimelineEventRequest) -> Result<Self, Self::Error> {
        let mut issues = Vec::new();

        let event_type = match request.event_type.as_deref() {
            None => {
                issues.push(FieldIssue::new("eventType", "eventType is required"));
                None
            }
            Some(raw) => {
                let parsed = TimelineEventType::parse(raw);
                if parsed.is_none() {
                    issues.push(FieldIssue::new(
                        "eventType",
                        format!("unsupported event type '{raw}'"),
                    ));
                }
                parsed
            }
        };

        let visibility = match request.visibility.as_deref() {
            None => EventVisibility::Public,
            Some(raw) => parse_visibility(raw).unwrap_or_else(|| {
                issues.push(FieldIssue::new(
                    "visibility",
                    "visibility must be PUBLIC, INTERNAL or BUYER_ONLY",
                ));
                EventVisibility::Public
            }),
        };

        let metadata = match request.metadata {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                issues.push(FieldIssue::new("metadata", "metadata must be an object"));
                Map::new()
            }
        };

        let scheduled_date = match request.scheduled_date.as_deref() {
            None => None,
            Some(raw) => match DateTime::parse_from_rfc3339(raw.trim()) {
                Ok(parsed) => Some(parsed.with_timezone(&Utc)),
                Err(_) => {
                    issues.push(FieldIssue::new(
                        "scheduledDate",
                        "scheduledDate must be an RFC 3339 timestamp",
                    ));
                    None
                }
            },
        };

        let candidate = Self {
            event_type: event_type.unwrap_or(TimelineEventType::NoteAdded),
            title: request.title.unwrap_or_default(),
            description: request.description,
            metadata,
            visibility,
            related_document_id: request.related_document_id,
            scheduled_date,
        };
        if let Err(mut limits) = candidate.validate() {
            issues.append(&mut limits);
        }

        if issues.is_empty() {
            Ok(candidate)
        } else {
            Err(issues)
        }
    }
}

/// Timeline row enriched for API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEventView {
    #[serde(flatten)]
    pub event: TimelineEvent,
    pub category: EventCategory,
    pub time_ago: String,
}

impl TimelineEventView {
    pub fn new(event: TimelineEvent, now: DateTime<Utc>) -> Self {
        Self {
            category: event.event_type.category(),
            time_ago: time_ago(now, event.event_date),
            event,
        }
    }
}

/// Follow-up note scheduled automatically after certain events, if any.
///
/// The follow-up shares the trigger's `event_date` and is scheduled relative to it.
pub fn follow_up_for(trigger: &TimelineEvent) -> Option<NewTimelineEvent> {
    let (title, description, kind, days) = match trigger.event_type {
        TimelineEventType::PaymentReceived => (
            "Documentation Required",
            "Please upload the supporting documents for your recent payment.",
            "documentation",
            DOCUMENTATION_FOLLOW_UP_DAYS,
        ),
        TimelineEventType::ExtensionGranted => (
            "Reservation Expiry Reminder",
            "Your extended reservation is approaching its new expiry date.",
            "expiry_reminder",
            EXPIRY_REMINDER_DAYS,
        ),
        _ => return None,
    };

    Some(
        NewTimelineEvent::new(TimelineEventType::NoteAdded, title)
            .with_description(description)
            .with_visibility(EventVisibility::BuyerOnly)
            .with_metadata("autoGenerated", json!(true))
            .with_metadata("triggerEventId", json!(trigger.id.0))
            .with_metadata("followUpType", json!(kind))
            .scheduled_for(trigger.event_date + Duration::days(days)),
    )
}
