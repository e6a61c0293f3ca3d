use chrono::{DateTime, Utc};

use super::domain::{Reservation, ReservationId, ReservationStatus, TimelineEvent};
use crate::accounts::UserId;
use crate::store::RepositoryError;

/// Storage contract for reservations and their append-only timelines.
pub trait ReservationRepository: Send + Sync {
    fn reservation(&self, id: &ReservationId) -> Result<Option<Reservation>, RepositoryError>;
    /// Newest reservations first.
    fn reservations_for(&self, user_id: &UserId) -> Result<Vec<Reservation>, RepositoryError>;
    /// Fails with `Conflict` when the unit is still held at the new reservation's `created_at`.
    fn insert_reservation(&self, reservation: Reservation)
        -> Result<Reservation, RepositoryError>;
    /// Move a reservation to `status`; `Completed` also stamps the completion date.
    fn update_status(
        &self,
        id: &ReservationId,
        status: ReservationStatus,
        at: DateTime<Utc>,
    ) -> Result<Reservation, RepositoryError>;
    /// Fails with `NotFound` when the parent reservation is missing.
    fn insert_event(&self, event: TimelineEvent) -> Result<TimelineEvent, RepositoryError>;
    /// Events in append order.
    fn events(&self, reservation_id: &ReservationId)
        -> Result<Vec<TimelineEvent>, RepositoryError>;
}
