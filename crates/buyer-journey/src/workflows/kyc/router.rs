use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Json, Router,
};

use super::repository::KycRepository;
use super::service::{KycReviewRequest, KycServiceError, KycStatusReport, KycStatusService};
use crate::accounts::{UserDirectory, UserId};
use crate::auth::{RequireAuth, RouteState};
use crate::error::{ApiError, FieldIssue};

/// Router builder exposing the enhanced KYC status and review endpoints.
pub fn kyc_router<S>(state: RouteState<KycStatusService<S>>) -> Router
where
    S: UserDirectory + KycRepository + 'static,
{
    Router::new()
        .route(
            "/api/kyc/status-enhanced/:user_id",
            get(status_handler::<S>).patch(review_handler::<S>),
        )
        .with_state(state)
}

fn required_user_id(raw: &str) -> Result<UserId, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(ApiError::invalid_field("userId", "user id is required"))
    } else {
        Ok(UserId::new(trimmed))
    }
}

pub(crate) async fn status_handler<S>(
    State(state): State<RouteState<KycStatusService<S>>>,
    Path(user_id): Path<String>,
    auth: Result<RequireAuth, ApiError>,
) -> Result<Json<KycStatusReport>, ApiError>
where
    S: UserDirectory + KycRepository + 'static,
{
    let user_id = required_user_id(&user_id)?;
    let RequireAuth(principal) = auth?;
    Ok(Json(state.service.status_report(&principal, &user_id)?))
}

pub(crate) async fn review_handler<S>(
    State(state): State<RouteState<KycStatusService<S>>>,
    Path(user_id): Path<String>,
    auth: Result<RequireAuth, ApiError>,
    body: Result<Json<KycReviewRequest>, JsonRejection>,
) -> Result<Json<KycStatusReport>, ApiError>
where
    S: UserDirectory + KycRepository + 'static,
{
    let user_id = required_user_id(&user_id)?;
    let RequireAuth(principal) = auth?;
    let Json(request) = body.map_err(|rejection| {
        ApiError::validation(vec![FieldIssue::new("body", rejection.body_text())])
    })?;
    Ok(Json(state.service.review(&principal, &user_id, request)?))
}

impl From<KycServiceError> for ApiError {
    fn from(value: KycServiceError) -> Self {
        match value {
            KycServiceError::Forbidden => ApiError::forbidden(),
            KycServiceError::UserNotFound => ApiError::NotFound("user not found".to_string()),
            KycServiceError::VerificationNotFound => {
                ApiError::NotFound("verification not found".to_string())
            }
            KycServiceError::Validation(details) => ApiError::validation(details),
            KycServiceError::Repository(error) => ApiError::from(error),
        }
    }
}
