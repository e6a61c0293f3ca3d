use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::domain::{
    EventId, EventVisibility, Reservation, ReservationId, ReservationStatus, TimelineEvent,
    TimelineEventType,
};
use super::milestones::{project_milestones, Milestone};
use super::recorder::{follow_up_for, NewTimelineEvent, TimelineEventView};
use super::repository::ReservationRepository;
use crate::accounts::UserId;
use crate::auth::Principal;
use crate::clock::Clock;
use crate::config::TimelineConfig;
use crate::error::FieldIssue;
use crate::store::RepositoryError;

const DEFAULT_HOLD_DAYS: i64 = 30;

static RESERVATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static EVENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_reservation_id() -> ReservationId {
    let id = RESERVATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ReservationId(format!("res-{id:06}"))
}

fn next_event_id() -> EventId {
    let id = EVENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EventId(format!("evt-{id:06}"))
}

/// Filters accepted by the timeline read endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineQuery {
    pub event_type: Option<TimelineEventType>,
    pub limit: Option<usize>,
    pub offset: usize,
    pub include_internal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePage {
    pub reservation_id: ReservationId,
    pub status: ReservationStatus,
    pub events: Vec<TimelineEventView>,
    pub pagination: Pagination,
    pub milestones: Vec<Milestone>,
    pub upcoming_events: Vec<TimelineEventView>,
}

/// Body accepted by `POST /api/reservations`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub user_id: Option<UserId>,
    pub unit_id: String,
    pub development_name: String,
    pub deposit_amount: u32,
    pub total_property_price: u32,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Service recording reservation timeline events and projecting milestones on read.
pub struct ReservationTimelineService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    config: TimelineConfig,
}

impl<R> ReservationTimelineService<R>
where
    R: ReservationRepository + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>, config: TimelineConfig) -> Self {
        Self {
            repository,
            clock,
            config,
        }
    }

    fn authorized_reservation(
        &self,
        principal: &Principal,
        reservation_id: &ReservationId,
    ) -> Result<Reservation, TimelineError> {
        let reservation = self
            .repository
            .reservation(reservation_id)?
            .ok_or(TimelineError::ReservationNotFound)?;
        if principal.owns(&reservation.user_id) || principal.is_elevated() {
            Ok(reservation)
        } else {
            Err(TimelineError::Forbidden("reservation belongs to another buyer"))
        }
    }

    /// Append an event to a reservation timeline and schedule any follow-up note.
    pub fn create_event(
        &self,
        principal: &Principal,
        reservation_id: &ReservationId,
        request: NewTimelineEvent,
    ) -> Result<TimelineEventView, TimelineError> {
        request.validate().map_err(TimelineError::Validation)?;
        let reservation = self.authorized_reservation(principal, reservation_id)?;
        if request.visibility == EventVisibility::Internal && !principal.is_elevated() {
            return Err(TimelineError::Forbidden(
                "internal events require a staff role",
            ));
        }
        let transition = request.requested_status();
        if transition.is_some() && !principal.is_elevated() {
            return Err(TimelineError::Forbidden(
                "status changes require a staff role",
            ));
        }

        let now = self.clock.now();
        let event = request.into_event(
            next_event_id(),
            reservation.id.clone(),
            now,
            Some(principal.user_id.clone()),
        );
        let stored = self.repository.insert_event(event)?;
        info!(
            reservation_id = %reservation.id,
            event_id = %stored.id.0,
            event_type = stored.event_type.as_str(),
            "timeline event recorded"
        );

        if let Some(status) = transition {
            let updated = self.repository.update_status(&reservation.id, status, now)?;
            info!(
                reservation_id = %updated.id,
                from = reservation.status.as_str(),
                to = updated.status.as_str(),
                "reservation status changed"
            );
        }

        self.schedule_follow_up(&stored);
        Ok(TimelineEventView::new(stored, now))
    }

    fn schedule_follow_up(&self, trigger: &TimelineEvent) {
        let Some(follow_up) = follow_up_for(trigger) else {
            return;
        };
        let event = follow_up.into_event(
            next_event_id(),
            trigger.reservation_id.clone(),
            trigger.event_date,
            None,
        );
        match self.repository.insert_event(event) {
            Ok(stored) => info!(
                reservation_id = %stored.reservation_id,
                trigger_event_id = %trigger.id.0,
                scheduled_date = ?stored.scheduled_date,
                "follow-up event scheduled"
            ),
            Err(error) => warn!(
                reservation_id = %trigger.reservation_id,
                trigger_event_id = %trigger.id.0,
                %error,
                "failed to schedule follow-up event"
            ),
        }
    }

    /// Paginated, visibility-filtered timeline with milestones and upcoming events.
    pub fn timeline(
        &self,
        principal: &Principal,
        reservation_id: &ReservationId,
        query: &TimelineQuery,
    ) -> Result<TimelinePage, TimelineError> {
        let reservation = self.authorized_reservation(principal, reservation_id)?;
        let events = self.repository.events(&reservation.id)?;
        let now = self.clock.now();
        let include_internal = query.include_internal && principal.is_elevated();

        let milestones = project_milestones(&reservation, &events);

        let visible: Vec<&TimelineEvent> = events
            .iter()
            .filter(|event| event.visibility.visible_to(include_internal))
            .collect();

        let mut upcoming: Vec<&TimelineEvent> = visible
            .iter()
            .copied()
            .filter(|event| event.scheduled_date.is_some_and(|when| when > now))
            .collect();
        upcoming.sort_by_key(|event| event.scheduled_date);

        // Newest first; among equal dates the later append wins.
        let mut matching: Vec<&TimelineEvent> = visible
            .into_iter()
            .rev()
            .filter(|event| {
                query
                    .event_type
                    .map_or(true, |wanted| event.event_type == wanted)
            })
            .collect();
        matching.sort_by(|a, b| b.event_date.cmp(&a.event_date));

        let limit = self.config.page_size(query.limit);
        let total = matching.len();
        let page: Vec<TimelineEventView> = matching
            .into_iter()
            .skip(query.offset)
            .take(limit)
            .map(|event| TimelineEventView::new(event.clone(), now))
            .collect();

        Ok(TimelinePage {
            reservation_id: reservation.id.clone(),
            status: reservation.effective_status(now),
            pagination: Pagination {
                total,
                limit,
                offset: query.offset,
                has_more: query.offset.saturating_add(page.len()) < total,
            },
            events: page,
            milestones,
            upcoming_events: upcoming
                .into_iter()
                .map(|event| TimelineEventView::new(event.clone(), now))
                .collect(),
        })
    }

    /// Place a hold on a unit and open its timeline with a creation event.
    pub fn create_reservation(
        &self,
        principal: &Principal,
        request: NewReservation,
    ) -> Result<Reservation, TimelineError> {
        let owner = match request.user_id {
            Some(user_id) if !principal.owns(&user_id) => {
                if !principal.is_admin() {
                    return Err(TimelineError::Forbidden(
                        "only administrators may reserve on behalf of another buyer",
                    ));
                }
                user_id
            }
            _ => principal.user_id.clone(),
        };

        let now = self.clock.now();
        let mut issues = Vec::new();
        if request.unit_id.trim().is_empty() {
            issues.push(FieldIssue::new("unitId", "unitId is required"));
        }
        if request.development_name.trim().is_empty() {
            issues.push(FieldIssue::new(
                "developmentName",
                "developmentName is required",
            ));
        }
        if request.total_property_price == 0 {
            issues.push(FieldIssue::new(
                "totalPropertyPrice",
                "totalPropertyPrice must be positive",
            ));
        }
        if request.deposit_amount > request.total_property_price {
            issues.push(FieldIssue::new(
                "depositAmount",
                "depositAmount cannot exceed the property price",
            ));
        }
        if request.expiry_date.is_some_and(|expiry| expiry <= now) {
            issues.push(FieldIssue::new(
                "expiryDate",
                "expiryDate must be in the future",
            ));
        }
        if !issues.is_empty() {
            return Err(TimelineError::Validation(issues));
        }

        let reservation = Reservation {
            id: next_reservation_id(),
            user_id: owner,
            unit_id: request.unit_id.trim().to_string(),
            development_name: request.development_name.trim().to_string(),
            status: ReservationStatus::Pending,
            deposit_amount: request.deposit_amount,
            deposit_paid: false,
            total_property_price: request.total_property_price,
            created_at: now,
            expiry_date: Some(
                request
                    .expiry_date
                    .unwrap_or(now + Duration::days(DEFAULT_HOLD_DAYS)),
            ),
            completion_date: None,
        };

        let stored = self
            .repository
            .insert_reservation(reservation)
            .map_err(|error| match error {
                RepositoryError::Conflict => TimelineError::UnitUnavailable,
                other => TimelineError::Repository(other),
            })?;
        info!(
            reservation_id = %stored.id,
            unit_id = %stored.unit_id,
            user_id = %stored.user_id,
            "reservation created"
        );

        let opening = NewTimelineEvent::new(TimelineEventType::ReservationCreated, "Reservation Created")
            .with_description(format!(
                "Unit {} at {} reserved.",
                stored.unit_id, stored.development_name
            ))
            .with_metadata("unitId", json!(stored.unit_id))
            .with_metadata("depositAmount", json!(stored.deposit_amount))
            .into_event(
                next_event_id(),
                stored.id.clone(),
                now,
                Some(principal.user_id.clone()),
            );
        if let Err(error) = self.repository.insert_event(opening) {
            warn!(reservation_id = %stored.id, %error, "failed to record reservation creation event");
        }

        Ok(stored)
    }
}

/// Error raised by the reservation timeline service.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("reservation not found")]
    ReservationNotFound,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("invalid timeline request")]
    Validation(Vec<FieldIssue>),
    #[error("unit already has a live reservation")]
    UnitUnavailable,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
