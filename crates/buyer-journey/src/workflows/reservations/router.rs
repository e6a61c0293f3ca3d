use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{ReservationId, TimelineEventType};
use super::recorder::{NewTimelineEvent, TimelineEventRequest};
use super::repository::ReservationRepository;
use super::service::{NewReservation, ReservationTimelineService, TimelineError, TimelineQuery};
use crate::auth::{RequireAuth, RouteState};
use crate::error::{ApiError, FieldIssue};

/// Router builder exposing reservation creation and timeline endpoints.
pub fn reservation_router<R>(state: RouteState<ReservationTimelineService<R>>) -> Router
where
    R: ReservationRepository + 'static,
{
    Router::new()
        .route("/api/reservations", post(create_reservation_handler::<R>))
        .route(
            "/api/reservations/:reservation_id/timeline",
            get(timeline_handler::<R>).post(create_event_handler::<R>),
        )
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TimelineParams {
    event_type: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
    include_internal: Option<bool>,
}

impl TryFrom<TimelineParams> for TimelineQuery {
    type Error = ApiError;

    fn try_from(params: TimelineParams) -> Result<Self, Self::Error> {
        let event_type = match params.event_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(TimelineEventType::parse(raw).ok_or_else(|| {
                ApiError::invalid_field("eventType", format!("unsupported event type '{raw}'"))
            })?),
        };
        Ok(TimelineQuery {
            event_type,
            limit: params.limit,
            offset: params.offset.unwrap_or(0),
            include_internal: params.include_internal.unwrap_or(false),
        })
    }
}

fn body_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::validation(vec![FieldIssue::new("body", rejection.body_text())])
}

pub(crate) async fn timeline_handler<R>(
    State(state): State<RouteState<ReservationTimelineService<R>>>,
    Path(reservation_id): Path<String>,
    RequireAuth(principal): RequireAuth,
    params: Result<Query<TimelineParams>, QueryRejection>,
) -> Result<Response, ApiError>
where
    R: ReservationRepository + 'static,
{
    let Query(params) = params
        .map_err(|rejection| ApiError::invalid_field("query", rejection.body_text()))?;
    let query = TimelineQuery::try_from(params)?;

    let page = state
        .service
        .timeline(&principal, &ReservationId::new(reservation_id), &query)?;
    Ok(Json(page).into_response())
}

pub(crate) async fn create_event_handler<R>(
    State(state): State<RouteState<ReservationTimelineService<R>>>,
    Path(reservation_id): Path<String>,
    RequireAuth(principal): RequireAuth,
    body: Result<Json<TimelineEventRequest>, JsonRejection>,
) -> Result<Response, ApiError>
where
    R: ReservationRepository + 'static,
{
    let Json(request) = body.map_err(body_rejection)?;
    let event = NewTimelineEvent::try_from(request).map_err(ApiError::validation)?;

    let view = state
        .service
        .create_event(&principal, &ReservationId::new(reservation_id), event)?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

pub(crate) async fn create_reservation_handler<R>(
    State(state): State<RouteState<ReservationTimelineService<R>>>,
    RequireAuth(principal): RequireAuth,
    body: Result<Json<NewReservation>, JsonRejection>,
) -> Result<Response, ApiError>
where
    R: ReservationRepository + 'static,
{
    let Json(request) = body.map_err(body_rejection)?;

    let reservation = state.service.create_reservation(&principal, request)?;
    Ok((StatusCode::CREATED, Json(reservation)).into_response())
}

impl From<TimelineError> for ApiError {
    fn from(value: TimelineError) -> Self {
        match value {
            TimelineError::ReservationNotFound => {
                ApiError::NotFound("reservation not found".to_string())
            }
            TimelineError::Forbidden(reason) => ApiError::Authorization(reason.to_string()),
            TimelineError::Validation(details) => ApiError::validation(details),
            TimelineError::UnitUnavailable => {
                ApiError::Conflict("unit already has a live reservation".to_string())
            }
            TimelineError::Repository(error) => ApiError::from(error),
        }
    }
}
