use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use crate::workflows::buyer::buyer_router;
use crate::workflows::reservations::domain::ReservationStatus;
use crate::workflows::reservations::ReservationRepository;

fn get(path: &str, token: Option<&str>) -> Request<Body> {
    let mut request = Request::get(path);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    request.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn owner_receives_dashboard() {
    let harness = Harness::new();
    harness
        .store
        .insert_reservation(reservation(
            "r1",
            "buyer-1",
            ReservationStatus::Active,
            Some(now() + chrono::Duration::days(5)),
        ))
        .expect("reservation");
    let router = buyer_router(harness.route_state());

    let response = router
        .oneshot(get("/api/buyer/profile/buyer-1", Some("dev-token-buyer-1")))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["profile"]["user"]["id"], "buyer-1");
    assert!(payload["journey"].is_null());
    assert_eq!(payload["metrics"]["journeyProgress"], 0);
    assert_eq!(payload["propertyActivity"]["summary"]["active"], 1);
    assert_eq!(payload["alerts"][0]["kind"], "RESERVATION_EXPIRING");
    assert_eq!(payload["alerts"][0]["daysRemaining"], 5);
    assert_eq!(payload["nextSteps"][0]["title"], "Run Affordability Check");
    assert_eq!(payload["upcomingMilestones"][0]["priority"], "high");
    assert_eq!(payload["upcomingMilestones"][0]["category"], "property");
    assert!(payload["metrics"]["completionPrediction"].is_null());
}

#[tokio::test]
async fn admin_may_read_any_dashboard() {
    let harness = Harness::new();
    let response = buyer_router(harness.route_state())
        .oneshot(get("/api/buyer/profile/buyer-1", Some("dev-token-admin-1")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_session_is_unauthorized() {
    let harness = Harness::new();
    let response = buyer_router(harness.route_state())
        .oneshot(get("/api/buyer/profile/buyer-1", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = buyer_router(harness.route_state())
        .oneshot(get("/api/buyer/profile/buyer-1", Some("forged")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn other_buyers_are_forbidden() {
    let harness = Harness::new();
    let response = buyer_router(harness.route_state())
        .oneshot(get("/api/buyer/profile/buyer-1", Some("dev-token-buyer-2")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let payload = read_json_body(response).await;
    assert_eq!(payload["code"], "FORBIDDEN");
}

#[tokio::test]
async fn missing_profile_is_not_found() {
    let harness = Harness::new();
    let response = buyer_router(harness.route_state())
        .oneshot(get("/api/buyer/profile/buyer-2", Some("dev-token-buyer-2")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_user_id_is_rejected_before_auth() {
    let harness = Harness::new();
    let response = buyer_router(harness.route_state())
        .oneshot(get("/api/buyer/profile/%20", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn issued_session_tokens_are_accepted_as_bearers() {
    let harness = Harness::new();
    let token = harness
        .auth
        .open_session(&crate::accounts::UserId::new("buyer-1"))
        .await
        .expect("session opened");
    let router = buyer_router(harness.route_state());

    let response = router
        .oneshot(get("/api/buyer/profile/buyer-1", Some(&token)))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
}
