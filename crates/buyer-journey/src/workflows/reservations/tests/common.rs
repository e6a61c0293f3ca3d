use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::accounts::{Role, User, UserDirectory, UserId};
use crate::auth::{Principal, RouteState, SessionAuthenticator};
use crate::clock::FixedClock;
use crate::config::{AuthConfig, TimelineConfig};
use crate::store::{InMemoryStore, RepositoryError};
use crate::workflows::kyc::domain::KycStatus;
use crate::workflows::reservations::domain::{
    Reservation, ReservationId, ReservationStatus, TimelineEvent,
};
use crate::workflows::reservations::{ReservationRepository, ReservationTimelineService};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 14, 15, 30, 0).unwrap()
}

pub(super) fn principal(id: &str, role: Role) -> Principal {
    Principal::new(UserId::new(id), vec![role])
}

fn user(id: &str, role: Role) -> User {
    User {
        id: UserId::new(id),
        email: format!("{id}@example.ie"),
        first_name: None,
        last_name: None,
        phone: None,
        roles: vec![role],
        kyc_status: KycStatus::Approved,
        created_at: now() - Duration::days(120),
        last_active: None,
    }
}

pub(super) fn reservation(id: &str, owner: &str) -> Reservation {
    Reservation {
        id: ReservationId::new(id),
        user_id: UserId::new(owner),
        unit_id: format!("unit-{id}"),
        development_name: "Fitzgerald Gardens".to_string(),
        status: ReservationStatus::Active,
        deposit_amount: 10_000,
        deposit_paid: true,
        total_property_price: 385_000,
        created_at: now() - Duration::days(14),
        expiry_date: Some(now() + Duration::days(16)),
        completion_date: None,
    }
}

pub(super) fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::default());
    for (id, role) in [
        ("buyer-1", Role::Buyer),
        ("buyer-2", Role::Buyer),
        ("agent-1", Role::Agent),
        ("admin-1", Role::Admin),
        ("solicitor-1", Role::Solicitor),
    ] {
        store.insert_user(user(id, role)).expect("user");
    }
    store
        .insert_reservation(reservation("res-1", "buyer-1"))
        .expect("reservation");
    store
}

pub(super) fn service_for<R>(repository: Arc<R>) -> ReservationTimelineService<R>
where
    R: ReservationRepository + 'static,
{
    ReservationTimelineService::new(
        repository,
        Arc::new(FixedClock(now())),
        TimelineConfig::new(50, 100),
    )
}

/// Route state accepting `dev-token-<user>` bearers alongside real sessions.
pub(super) fn route_state(
    store: Arc<InMemoryStore>,
) -> RouteState<ReservationTimelineService<InMemoryStore>> {
    RouteState::new(Arc::new(service_for(store.clone())), mock_auth(store))
}

fn mock_auth(store: Arc<InMemoryStore>) -> Arc<SessionAuthenticator> {
    Arc::new(SessionAuthenticator::new(
        store,
        AuthConfig {
            allow_mock_auth: true,
            ..AuthConfig::default()
        },
    ))
}

/// Repository that accepts the first event and refuses every later write.
pub(super) struct FlakyTimeline {
    pub inner: Arc<InMemoryStore>,
}

impl ReservationRepository for FlakyTimeline {
    fn reservation(&self, id: &ReservationId) -> Result<Option<Reservation>, RepositoryError> {
        self.inner.reservation(id)
    }

    fn reservations_for(&self, user_id: &UserId) -> Result<Vec<Reservation>, RepositoryError> {
        self.inner.reservations_for(user_id)
    }

    fn insert_reservation(
        &self,
        reservation: Reservation,
    ) -> Result<Reservation, RepositoryError> {
        self.inner.insert_reservation(reservation)
    }

    fn update_status(
        &self,
        id: &ReservationId,
        status: ReservationStatus,
        at: DateTime<Utc>,
    ) -> Result<Reservation, RepositoryError> {
        self.inner.update_status(id, status, at)
    }

    fn insert_event(&self, event: TimelineEvent) -> Result<TimelineEvent, RepositoryError> {
        if self.inner.events(&event.reservation_id)?.is_empty() {
            self.inner.insert_event(event)
        } else {
            Err(RepositoryError::Unavailable("timeline write refused".to_string()))
        }
    }

    fn events(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<Vec<TimelineEvent>, RepositoryError> {
        self.inner.events(reservation_id)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
