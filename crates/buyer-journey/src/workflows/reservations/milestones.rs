use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Reservation, TimelineEvent, TimelineEventType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneKind {
    ReservationCreated,
    InitialPayment,
    DocumentationComplete,
    FinalPayment,
    Completion,
}

impl MilestoneKind {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::ReservationCreated,
            Self::InitialPayment,
            Self::DocumentationComplete,
            Self::FinalPayment,
            Self::Completion,
        ]
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::ReservationCreated => "Reservation Created",
            Self::InitialPayment => "Initial Payment",
            Self::DocumentationComplete => "Documentation Complete",
            Self::FinalPayment => "Final Payment",
            Self::Completion => "Completion",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub kind: MilestoneKind,
    pub title: &'static str,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Progress {
    created: Option<DateTime<Utc>>,
    initial_payment: Option<DateTime<Utc>>,
    documentation: Option<DateTime<Utc>>,
    final_payment: Option<DateTime<Utc>>,
    completion: Option<DateTime<Utc>>,
    payments_seen: usize,
}

impl Progress {
    fn observe(&mut self, event: &TimelineEvent) {
        let at = event.event_date;
        match event.event_type {
            TimelineEventType::ReservationCreated => {
                self.created.get_or_insert(at);
            }
            TimelineEventType::PaymentReceived => {
                self.payments_seen += 1;
                let is_final = event
                    .metadata_str("paymentType")
                    .is_some_and(|kind| kind.eq_ignore_ascii_case("FINAL"));
                if self.initial_payment.is_none() {
                    self.initial_payment = Some(at);
                }
                if is_final || self.payments_seen >= 2 {
                    self.final_payment.get_or_insert(at);
                }
            }
            TimelineEventType::DocumentUploaded => {
                if event.metadata_flag("documentationComplete") {
                    self.documentation.get_or_insert(at);
                }
            }
            TimelineEventType::StatusChange => {
                let completed = event
                    .metadata_str("newStatus")
                    .is_some_and(|status| status.eq_ignore_ascii_case("COMPLETED"));
                if completed {
                    self.completion.get_or_insert(at);
                }
            }
            TimelineEventType::ExtensionGranted
            | TimelineEventType::AppointmentScheduled
            | TimelineEventType::NoteAdded
            | TimelineEventType::CommunicationSent => {}
        }
    }

    fn completed_at(&self, kind: MilestoneKind) -> Option<DateTime<Utc>> {
        match kind {
            MilestoneKind::ReservationCreated => self.created,
            MilestoneKind::InitialPayment => self.initial_payment,
            MilestoneKind::DocumentationComplete => self.documentation,
            MilestoneKind::FinalPayment => self.final_payment,
            MilestoneKind::Completion => self.completion,
        }
    }
}

/// Project the fixed milestone list from the full event log.
///
/// Events are scanned in chronological order (ties keep append order); nothing is persisted,
/// so the result is recomputed on every read. The creation milestone falls back to the
/// reservation's own timestamp when no creation event was recorded.
pub fn project_milestones(reservation: &Reservation, events: &[TimelineEvent]) -> Vec<Milestone> {
    let mut ordered: Vec<&TimelineEvent> = events.iter().collect();
    ordered.sort_by_key(|event| event.event_date);

    let mut progress = Progress::default();
    for event in ordered {
        progress.observe(event);
    }
    progress.created.get_or_insert(reservation.created_at);

    MilestoneKind::ordered()
        .into_iter()
        .map(|kind| {
            let completed_at = progress.completed_at(kind);
            Milestone {
                kind,
                title: kind.title(),
                completed: completed_at.is_some(),
                completed_at,
            }
        })
        .collect()
}
