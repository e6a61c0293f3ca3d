use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::accounts::{UserDirectory, UserId};
use crate::workflows::kyc::domain::KycStatus;
use crate::workflows::kyc::{kyc_router, KycRepository};

fn get(path: &str, token: &str) -> Request<Body> {
    Request::get(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn patch(path: &str, token: &str, body: Value) -> Request<Body> {
    Request::patch(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn owner_sees_masked_report() {
    let router = kyc_router(route_state(seeded_store()));

    let response = router
        .oneshot(get("/api/kyc/status-enhanced/buyer-1", "dev-token-buyer-1"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["formData"]["ppsNumber"], "76*****WA");
    assert_eq!(payload["formData"]["idNumber"], "PB*****54");
    assert_eq!(payload["progress"]["completedSteps"], 4);
    assert_eq!(payload["riskAssessment"]["level"], "LOW");
    assert_eq!(payload["nextStep"]["step"], "AWAIT_REVIEW");
    assert_eq!(payload["documents"].as_array().map(Vec::len), Some(4));
    assert_eq!(payload["complianceChecks"][0]["label"], "Sanctions screening");
    assert!(!payload.to_string().contains("7654321WA"));
}

#[tokio::test]
async fn user_without_verification_gets_empty_report() {
    let router = kyc_router(route_state(seeded_store()));
    let response = router
        .oneshot(get("/api/kyc/status-enhanced/buyer-2", "dev-token-buyer-2"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert!(payload["verification"].is_null());
    assert_eq!(payload["progress"]["completedSteps"], 0);
    assert_eq!(payload["nextStep"]["step"], "UPLOAD_ID_FRONT");
}

#[tokio::test]
async fn non_owner_non_admin_is_forbidden() {
    let router = kyc_router(route_state(seeded_store()));
    let response = router
        .oneshot(get("/api/kyc/status-enhanced/buyer-1", "dev-token-agent-1"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_review_updates_verification_user_and_history() {
    let store = seeded_store();
    let router = kyc_router(route_state(store.clone()));

    let response = router
        .oneshot(patch(
            "/api/kyc/status-enhanced/buyer-1",
            "dev-token-admin-1",
            json!({
                "status": "APPROVED",
                "reviewNotes": "Documents verified against passport",
                "reviewerId": "admin-1",
                "riskScore": 12,
                "complianceFlags": []
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["verification"]["status"], "APPROVED");
    assert_eq!(payload["verificationHistory"][0]["fromStatus"], "IN_REVIEW");
    assert_eq!(payload["verificationHistory"][0]["toStatus"], "APPROVED");
    assert_eq!(payload["user"]["kycStatus"], "APPROVED");

    let user = store.user(&UserId::new("buyer-1")).unwrap().unwrap();
    assert_eq!(user.kyc_status, KycStatus::Approved);
    let verification = store.verification(&UserId::new("buyer-1")).unwrap().unwrap();
    assert_eq!(verification.risk_score, Some(12));
    assert_eq!(verification.reviewed_by, Some(UserId::new("admin-1")));
}

#[tokio::test]
async fn review_rejects_unknown_status_and_out_of_range_score() {
    let store = seeded_store();
    let router = kyc_router(route_state(store.clone()));

    let response = router
        .oneshot(patch(
            "/api/kyc/status-enhanced/buyer-1",
            "dev-token-admin-1",
            json!({"status": "VERIFIED", "riskScore": 140}),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["code"], "VALIDATION_ERROR");
    assert_eq!(payload["details"][0]["field"], "status");
    assert_eq!(payload["details"][1]["field"], "riskScore");

    let verification = store.verification(&UserId::new("buyer-1")).unwrap().unwrap();
    assert_eq!(verification.status, KycStatus::InReview);
    assert!(verification.history.is_empty());
}

#[tokio::test]
async fn only_admins_may_review() {
    let router = kyc_router(route_state(seeded_store()));
    let response = router
        .oneshot(patch(
            "/api/kyc/status-enhanced/buyer-1",
            "dev-token-buyer-1",
            json!({"status": "APPROVED"}),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn review_of_missing_verification_is_not_found() {
    let router = kyc_router(route_state(seeded_store()));
    let response = router
        .oneshot(patch(
            "/api/kyc/status-enhanced/buyer-2",
            "dev-token-admin-1",
            json!({"status": "REJECTED"}),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_session_is_unauthorized() {
    let router = kyc_router(route_state(seeded_store()));
    let response = router
        .oneshot(
            Request::get("/api/kyc/status-enhanced/buyer-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn issued_session_tokens_are_accepted_as_bearers() {
    let state = route_state(seeded_store());
    let token = state
        .auth
        .open_session(&UserId::new("admin-1"))
        .await
        .expect("session opened");
    let router = kyc_router(state);

    let response = router
        .oneshot(get("/api/kyc/status-enhanced/buyer-1", &token))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
}
