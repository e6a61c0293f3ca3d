use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::accounts::{Role, User, UserDirectory, UserId};
use crate::auth::{RouteState, SessionAuthenticator};
use crate::clock::FixedClock;
use crate::config::AuthConfig;
use crate::store::InMemoryStore;
use crate::workflows::buyer::domain::{
    AffordabilityCheck, BuyerJourney, BuyerProfile, FinancialDetails, JourneyPhase,
    MortgageStatus, MortgageTracking, PhaseHistoryEntry, SearchPreferences,
};
use crate::workflows::buyer::{BuyerProfileService, BuyerRepository};
use crate::workflows::kyc::domain::KycStatus;
use crate::workflows::reservations::domain::{Reservation, ReservationId, ReservationStatus};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub(super) fn user(id: &str, roles: Vec<Role>) -> User {
    User {
        id: UserId::new(id),
        email: format!("{id}@example.ie"),
        first_name: Some("Sinead".to_string()),
        last_name: Some("Murphy".to_string()),
        phone: Some("+353 87 123 4567".to_string()),
        roles,
        kyc_status: KycStatus::NotStarted,
        created_at: now() - Duration::days(90),
        last_active: Some(now()),
    }
}

pub(super) fn profile(id: &str) -> BuyerProfile {
    BuyerProfile {
        user_id: UserId::new(id),
        financial_details: None,
        preferences: None,
        government_schemes: None,
        current_journey_phase: JourneyPhase::Planning,
        created_at: now() - Duration::days(60),
        updated_at: now() - Duration::days(1),
    }
}

pub(super) fn with_finances(mut profile: BuyerProfile) -> BuyerProfile {
    profile.financial_details = Some(FinancialDetails {
        annual_income: Some(72_000),
        savings: Some(45_000),
        monthly_debts: Some(250),
        deposit_amount: Some(40_000),
        max_budget: Some(380_000),
        htb_amount: Some(30_000),
    });
    profile
}

pub(super) fn with_preferences(mut profile: BuyerProfile) -> BuyerProfile {
    profile.preferences = Some(SearchPreferences {
        preferred_areas: vec!["Drogheda".to_string()],
        property_types: vec!["Semi-detached".to_string()],
        min_bedrooms: Some(3),
        max_bedrooms: Some(4),
        max_price: Some(400_000),
    });
    profile
}

pub(super) fn journey(id: &str, phase: JourneyPhase) -> BuyerJourney {
    BuyerJourney {
        buyer_id: UserId::new(id),
        current_phase: phase,
        start_date: now() - Duration::days(45),
        target_move_in_date: None,
        notes: None,
        phase_history: vec![PhaseHistoryEntry {
            phase,
            phase_start_date: now() - Duration::hours(60),
            phase_end_date: None,
            notes: None,
        }],
        affordability_checks: Vec::new(),
        mortgage_applications: Vec::new(),
    }
}

pub(super) fn affordability_check() -> AffordabilityCheck {
    AffordabilityCheck {
        id: "aff-1".to_string(),
        max_property_price: 360_000,
        deposit_amount: 36_000,
        max_mortgage: 324_000,
        monthly_repayment: 1_450,
        htb_amount: Some(30_000),
        loan_to_value: 0.9,
        created_at: now() - Duration::days(3),
    }
}

pub(super) fn mortgage(id: &str) -> MortgageTracking {
    MortgageTracking {
        user_id: UserId::new(id),
        status: MortgageStatus::AipIssued,
        lender: Some("Bank of Ireland".to_string()),
        amount: Some(320_000),
        aip_date: Some(now() - Duration::days(150)),
        aip_expiry_date: None,
        formal_offer_date: None,
        offer_expiry_date: None,
        completion_date: None,
        documents: Vec::new(),
        updated_at: now() - Duration::days(2),
    }
}

pub(super) fn reservation(
    id: &str,
    owner: &str,
    status: ReservationStatus,
    expiry: Option<DateTime<Utc>>,
) -> Reservation {
    Reservation {
        id: ReservationId::new(id),
        user_id: UserId::new(owner),
        unit_id: format!("unit-{id}"),
        development_name: "Riverside Manor".to_string(),
        status,
        deposit_amount: 5_000,
        deposit_paid: true,
        total_property_price: 345_000,
        created_at: now() - Duration::days(10),
        expiry_date: expiry,
        completion_date: None,
    }
}

pub(super) struct Harness {
    pub store: Arc<InMemoryStore>,
    pub auth: Arc<SessionAuthenticator>,
}

impl Harness {
    pub(super) fn new() -> Self {
        let store = Arc::new(InMemoryStore::default());
        store
            .insert_user(user("buyer-1", vec![Role::Buyer]))
            .expect("buyer");
        store
            .insert_user(user("buyer-2", vec![Role::Buyer]))
            .expect("second buyer");
        store
            .insert_user(user("admin-1", vec![Role::Admin]))
            .expect("admin");
        store
            .save_profile(with_finances(profile("buyer-1")))
            .expect("profile");

        let auth = Arc::new(SessionAuthenticator::new(
            store.clone(),
            AuthConfig {
                allow_mock_auth: true,
                ..AuthConfig::default()
            },
        ));

        Self { store, auth }
    }

    pub(super) fn service(&self) -> BuyerProfileService<InMemoryStore> {
        BuyerProfileService::new(self.store.clone(), Arc::new(FixedClock(now())))
    }

    pub(super) fn route_state(&self) -> RouteState<BuyerProfileService<InMemoryStore>> {
        RouteState::new(Arc::new(self.service()), self.auth.clone())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
