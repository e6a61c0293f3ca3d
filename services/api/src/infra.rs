use axum::Router;
use buyer_journey::auth::{RouteState, SessionAuthenticator};
use buyer_journey::clock::Clock;
use buyer_journey::config::{AuthConfig, TimelineConfig};
use buyer_journey::store::InMemoryStore;
use buyer_journey::workflows::buyer::{buyer_router, BuyerProfileService};
use buyer_journey::workflows::kyc::{kyc_router, KycStatusService};
use buyer_journey::workflows::reservations::{reservation_router, ReservationTimelineService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// One store, one session store, and the three workflow services sharing them.
pub(crate) struct Platform {
    pub(crate) store: Arc<InMemoryStore>,
    pub(crate) sessions: Arc<SessionAuthenticator>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) buyer: Arc<BuyerProfileService<InMemoryStore>>,
    pub(crate) reservations: Arc<ReservationTimelineService<InMemoryStore>>,
    pub(crate) kyc: Arc<KycStatusService<InMemoryStore>>,
}

impl Platform {
    pub(crate) fn new(auth: AuthConfig, timeline: TimelineConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(InMemoryStore::default());
        let sessions = Arc::new(SessionAuthenticator::new(store.clone(), auth));
        Self {
            buyer: Arc::new(BuyerProfileService::new(store.clone(), clock.clone())),
            reservations: Arc::new(ReservationTimelineService::new(
                store.clone(),
                clock.clone(),
                timeline,
            )),
            kyc: Arc::new(KycStatusService::new(store.clone(), clock.clone())),
            store,
            sessions,
            clock,
        }
    }

    /// Workflow routes behind the `auth-token` cookie session layer.
    pub(crate) fn router(&self) -> Router {
        let auth = self.sessions.clone();
        buyer_router(RouteState::new(self.buyer.clone(), auth.clone()))
            .merge(reservation_router(RouteState::new(
                self.reservations.clone(),
                auth.clone(),
            )))
            .merge(kyc_router(RouteState::new(self.kyc.clone(), auth)))
            .layer(self.sessions.session_layer())
    }
}
