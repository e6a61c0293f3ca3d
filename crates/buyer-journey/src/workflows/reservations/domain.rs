use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::accounts::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(pub String);

impl ReservationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Active,
    Confirmed,
    Completed,
    Expired,
    Cancelled,
}

impl ReservationStatus {
    pub const fn all() -> [Self; 6] {
        [
            Self::Pending,
            Self::Active,
            Self::Confirmed,
            Self::Completed,
            Self::Expired,
            Self::Cancelled,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Confirmed => "CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let wanted = value.trim();
        Self::all()
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Active => "Active",
            Self::Confirmed => "Confirmed",
            Self::Completed => "Completed",
            Self::Expired => "Expired",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Statuses that still hold the unit.
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Pending | Self::Active | Self::Confirmed)
    }
}

/// A hold on a unit by a buyer. Owns its timeline events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: ReservationId,
    pub user_id: UserId,
    pub unit_id: String,
    pub development_name: String,
    pub status: ReservationStatus,
    pub deposit_amount: u32,
    pub deposit_paid: bool,
    pub total_property_price: u32,
    pub created_at: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub completion_date: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Stored status, except that a live hold reads as `Expired` once its expiry date has passed.
    pub fn effective_status(&self, now: DateTime<Utc>) -> ReservationStatus {
        match self.expiry_date {
            Some(expiry) if self.status.is_live() && expiry <= now => ReservationStatus::Expired,
            _ => self.status,
        }
    }

    /// Whether the reservation still blocks its unit at `now`.
    pub fn holds_unit(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now).is_live()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineEventType {
    ReservationCreated,
    StatusChange,
    PaymentReceived,
    DocumentUploaded,
    ExtensionGranted,
    AppointmentScheduled,
    NoteAdded,
    CommunicationSent,
}

impl TimelineEventType {
    pub const fn all() -> [Self; 8] {
        [
            Self::ReservationCreated,
            Self::StatusChange,
            Self::PaymentReceived,
            Self::DocumentUploaded,
            Self::ExtensionGranted,
            Self::AppointmentScheduled,
            Self::NoteAdded,
            Self::CommunicationSent,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReservationCreated => "RESERVATION_CREATED",
            Self::StatusChange => "STATUS_CHANGE",
            Self::PaymentReceived => "PAYMENT_RECEIVED",
            Self::DocumentUploaded => "DOCUMENT_UPLOADED",
            Self::ExtensionGranted => "EXTENSION_GRANTED",
            Self::AppointmentScheduled => "APPOINTMENT_SCHEDULED",
            Self::NoteAdded => "NOTE_ADDED",
            Self::CommunicationSent => "COMMUNICATION_SENT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let wanted = value.trim();
        Self::all()
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
    }

    pub const fn category(self) -> EventCategory {
        match self {
            Self::ReservationCreated | Self::StatusChange => EventCategory::Status,
            Self::PaymentReceived => EventCategory::Financial,
            Self::DocumentUploaded => EventCategory::Document,
            Self::ExtensionGranted => EventCategory::Administrative,
            Self::AppointmentScheduled => EventCategory::Scheduling,
            Self::NoteAdded | Self::CommunicationSent => EventCategory::Communication,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Status,
    Financial,
    Document,
    Administrative,
    Scheduling,
    Communication,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventVisibility {
    #[default]
    Public,
    Internal,
    BuyerOnly,
}

impl EventVisibility {
    /// Whether an event with this visibility may be shown to the given audience.
    pub const fn visible_to(self, include_internal: bool) -> bool {
        match self {
            Self::Public | Self::BuyerOnly => true,
            Self::Internal => include_internal,
        }
    }
}

/// Immutable timeline row. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: EventId,
    pub reservation_id: ReservationId,
    pub event_type: TimelineEventType,
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub visibility: EventVisibility,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub related_document_id: Option<String>,
    pub created_by: Option<UserId>,
}

impl TimelineEvent {
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn metadata_flag(&self, key: &str) -> bool {
        self.metadata
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
