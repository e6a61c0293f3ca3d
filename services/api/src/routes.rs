use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;

/// Attach the operational endpoints to the merged workflow routers.
pub(crate) fn with_service_routes(router: Router) -> Router {
    router
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{seed_demo, DEMO_BUYER};
    use crate::infra::Platform;
    use axum::body::Body;
    use axum::http::Request;
    use buyer_journey::clock::FixedClock;
    use buyer_journey::config::{AuthConfig, TimelineConfig};
    use chrono::{TimeZone, Utc};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    fn demo_platform() -> Platform {
        let now = Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap();
        Platform::new(
            AuthConfig::default(),
            TimelineConfig::default(),
            Arc::new(FixedClock(now)),
        )
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_tracks_the_flag() {
        let state = app_state(false);
        let response = readiness_endpoint(Extension(state.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let response = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn seeded_service_serves_every_workflow() {
        let platform = demo_platform();
        let seed = seed_demo(&platform).await.expect("demo seeds");
        let token = seed.token_for(DEMO_BUYER).expect("buyer session");
        let app = with_service_routes(platform.router()).layer(Extension(app_state(true)));

        let dashboard = app
            .clone()
            .oneshot(
                Request::get(format!("/api/buyer/profile/{}", seed.buyer))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("route executes");
        assert_eq!(dashboard.status(), StatusCode::OK);
        let dashboard = json_body(dashboard).await;
        assert_eq!(dashboard["journey"]["currentPhase"], "RESERVING");
        assert!(!dashboard["alerts"].as_array().expect("alerts").is_empty());

        let timeline = app
            .clone()
            .oneshot(
                Request::get(format!(
                    "/api/reservations/{}/timeline?includeInternal=true",
                    seed.reservation_id
                ))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .expect("route executes");
        assert_eq!(timeline.status(), StatusCode::OK);
        let timeline = json_body(timeline).await;
        let events = timeline["events"].as_array().expect("events");
        assert!(events.iter().all(|event| event["visibility"] != "INTERNAL"));
        assert_eq!(timeline["milestones"][1]["completed"], true);

        let kyc = app
            .oneshot(
                Request::get(format!("/api/kyc/status-enhanced/{}", seed.buyer))
                    .header(header::COOKIE, format!("auth-token={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("route executes");
        assert_eq!(kyc.status(), StatusCode::OK);
        let kyc = json_body(kyc).await;
        assert_eq!(kyc["nextStep"]["step"], "UPLOAD_ADDRESS_PROOF");
    }

    #[tokio::test]
    async fn workflow_routes_require_a_session() {
        let platform = demo_platform();
        let seed = seed_demo(&platform).await.expect("demo seeds");
        let app = with_service_routes(platform.router()).layer(Extension(app_state(true)));

        let response = app
            .oneshot(
                Request::get(format!("/api/buyer/profile/{}", seed.buyer))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
