use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::accounts::{Role, User, UserDirectory, UserId};
use crate::auth::{RouteState, SessionAuthenticator};
use crate::clock::FixedClock;
use crate::config::AuthConfig;
use crate::store::InMemoryStore;
use crate::workflows::kyc::domain::{
    ComplianceCheck, ComplianceCheckStatus, ComplianceCheckType, ComplianceResult,
    KycStatus, KycVerification, PersonalInfo, VerificationImages,
};
use crate::workflows::kyc::{KycRepository, KycStatusService};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 20, 11, 0, 0).unwrap()
}

pub(super) fn personal_info() -> PersonalInfo {
    PersonalInfo {
        first_name: Some("Darragh".to_string()),
        last_name: Some("O'Neill".to_string()),
        date_of_birth: NaiveDate::from_ymd_opt(1988, 11, 23),
        nationality: Some("Irish".to_string()),
        address_line1: Some("12 Laurel Drive".to_string()),
        city: Some("Dundalk".to_string()),
        county: Some("Louth".to_string()),
        pps_number: Some("7654321WA".to_string()),
        id_number: Some("PB7766554".to_string()),
        ..PersonalInfo::default()
    }
}

pub(super) fn check(result: Option<ComplianceResult>, status: ComplianceCheckStatus) -> ComplianceCheck {
    ComplianceCheck {
        id: "chk-1".to_string(),
        check_type: ComplianceCheckType::Sanctions,
        status,
        result,
        flags: Vec::new(),
        checked_at: Some(now()),
    }
}

pub(super) fn verification(user_id: &str) -> KycVerification {
    KycVerification {
        user_id: UserId::new(user_id),
        personal_info: PersonalInfo::default(),
        images: VerificationImages::default(),
        status: KycStatus::Pending,
        risk_score: None,
        is_politically_exposed: false,
        is_high_risk_country: false,
        compliance_flags: Vec::new(),
        review_notes: None,
        reviewed_by: None,
        submitted_at: None,
        reviewed_at: None,
        compliance_checks: Vec::new(),
        history: Vec::new(),
    }
}

pub(super) fn complete_verification(user_id: &str) -> KycVerification {
    KycVerification {
        personal_info: personal_info(),
        images: VerificationImages {
            id_front: Some("kyc/front.jpg".to_string()),
            id_back: None,
            selfie: Some("kyc/selfie.jpg".to_string()),
            address_proof: Some("kyc/utility-bill.pdf".to_string()),
        },
        status: KycStatus::InReview,
        submitted_at: Some(now()),
        compliance_checks: vec![check(
            Some(ComplianceResult::Clear),
            ComplianceCheckStatus::Completed,
        )],
        ..verification(user_id)
    }
}

fn user(id: &str, role: Role) -> User {
    User {
        id: UserId::new(id),
        email: format!("{id}@example.ie"),
        first_name: Some("Darragh".to_string()),
        last_name: Some("O'Neill".to_string()),
        phone: None,
        roles: vec![role],
        kyc_status: KycStatus::InReview,
        created_at: now(),
        last_active: None,
    }
}

pub(super) fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::default());
    store.insert_user(user("buyer-1", Role::Buyer)).expect("buyer");
    store.insert_user(user("buyer-2", Role::Buyer)).expect("buyer");
    store.insert_user(user("agent-1", Role::Agent)).expect("agent");
    store.insert_user(user("admin-1", Role::Admin)).expect("admin");
    store
        .save_verification(complete_verification("buyer-1"))
        .expect("verification");
    store
}

pub(super) fn route_state(store: Arc<InMemoryStore>) -> RouteState<KycStatusService<InMemoryStore>> {
    let auth = mock_auth(store.clone());
    let service = KycStatusService::new(store, Arc::new(FixedClock(now())));
    RouteState::new(Arc::new(service), auth)
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

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
