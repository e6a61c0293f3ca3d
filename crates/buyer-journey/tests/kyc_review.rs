use std::sync::Arc;

use buyer_journey::accounts::{Role, User, UserDirectory, UserId};
use buyer_journey::auth::Principal;
use buyer_journey::clock::FixedClock;
use buyer_journey::store::InMemoryStore;
use buyer_journey::workflows::kyc::domain::{PersonalInfo, VerificationImages};
use buyer_journey::workflows::kyc::{
    KycNextStep, KycRepository, KycReviewRequest, KycStatus, KycStatusService, KycVerification,
    RiskLevel,
};
use chrono::{DateTime, TimeZone, Utc};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 2, 14, 0, 0).unwrap()
}

fn account(id: &str, role: Role, kyc_status: KycStatus) -> User {
    User {
        id: UserId::new(id),
        email: format!("{id}@example.ie"),
        first_name: Some("Eoin".to_string()),
        last_name: Some("Brennan".to_string()),
        phone: None,
        roles: vec![role],
        kyc_status,
        created_at: now(),
        last_active: None,
    }
}

fn setup() -> (Arc<InMemoryStore>, KycStatusService<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::default());
    store
        .insert_user(account("buyer-3", Role::Buyer, KycStatus::Pending))
        .expect("buyer");
    store
        .insert_user(account("admin-4", Role::Admin, KycStatus::Approved))
        .expect("admin");
    store
        .save_verification(KycVerification {
            user_id: UserId::new("buyer-3"),
            personal_info: PersonalInfo {
                pps_number: Some("9988776FA".to_string()),
                ..PersonalInfo::default()
            },
            images: VerificationImages {
                id_front: Some("front.png".to_string()),
                ..VerificationImages::default()
            },
            status: KycStatus::Pending,
            risk_score: Some(15),
            is_politically_exposed: true,
            is_high_risk_country: false,
            compliance_flags: Vec::new(),
            review_notes: None,
            reviewed_by: None,
            submitted_at: Some(now()),
            reviewed_at: None,
            compliance_checks: Vec::new(),
            history: Vec::new(),
        })
        .expect("verification");
    let service = KycStatusService::new(store.clone(), Arc::new(FixedClock(now())));
    (store, service)
}

#[test]
fn report_then_review_moves_account_and_history_together() {
    let (store, service) = setup();
    let buyer = Principal::new(UserId::new("buyer-3"), vec![Role::Buyer]);
    let admin = Principal::new(UserId::new("admin-4"), vec![Role::Admin]);
    let buyer_id = UserId::new("buyer-3");

    let before = service
        .status_report(&buyer, &buyer_id)
        .expect("owner reads report");
    let risk = before.risk_assessment.expect("risk assessed");
    assert_eq!(risk.score, 45);
    assert_eq!(risk.level, RiskLevel::Medium);
    assert_eq!(before.next_step.step, KycNextStep::UploadSelfie);
    assert_eq!(before.progress.completed_steps, 0);
    let form = before.form_data.expect("form data");
    assert_eq!(form.pps_number.as_deref(), Some("99*****FA"));

    let after = service
        .review(
            &admin,
            &buyer_id,
            KycReviewRequest {
                status: "REJECTED".to_string(),
                review_notes: Some("Selfie missing".to_string()),
                reviewer_id: Some(UserId::new("admin-4")),
                risk_score: Some(35),
                compliance_flags: Some(vec!["incomplete-documents".to_string()]),
            },
        )
        .expect("review applied");

    let risk = after.risk_assessment.expect("risk assessed");
    assert_eq!(risk.score, 65);
    assert_eq!(risk.level, RiskLevel::High);
    assert_eq!(after.verification_history.len(), 1);
    assert_eq!(after.verification_history[0].from_status, KycStatus::Pending);

    let account = store.user(&buyer_id).expect("readable").expect("present");
    assert_eq!(account.kyc_status, KycStatus::Rejected);
    let stored = store
        .verification(&buyer_id)
        .expect("readable")
        .expect("present");
    assert_eq!(stored.compliance_flags, vec!["incomplete-documents"]);
    assert_eq!(stored.review_notes.as_deref(), Some("Selfie missing"));
}
