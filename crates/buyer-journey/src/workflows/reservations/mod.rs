//! Reservation holds and their append-only timelines.
//!
//! Timeline rows are immutable once written. Milestones are a pure projection over the full
//! log and are recomputed on every read.

pub mod domain;
pub mod milestones;
pub mod recorder;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    EventCategory, EventId, EventVisibility, Reservation, ReservationId, ReservationStatus,
    TimelineEvent, TimelineEventType,
};
pub use milestones::{project_milestones, Milestone, MilestoneKind};
pub use recorder::{follow_up_for, NewTimelineEvent, TimelineEventRequest, TimelineEventView};
pub use repository::ReservationRepository;
pub use router::reservation_router;
pub use service::{
    NewReservation, Pagination, ReservationTimelineService, TimelineError, TimelinePage,
    TimelineQuery,
};
