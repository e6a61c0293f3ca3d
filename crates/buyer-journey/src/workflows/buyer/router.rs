use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use super::repository::BuyerRepository;
use super::service::{BuyerDashboard, BuyerProfileService, BuyerServiceError};
use crate::accounts::{UserDirectory, UserId};
use crate::auth::{RequireAuth, RouteState};
use crate::error::ApiError;
use crate::workflows::reservations::ReservationRepository;

/// Router builder exposing the buyer dashboard endpoint.
pub fn buyer_router<S>(state: RouteState<BuyerProfileService<S>>) -> Router
where
    S: UserDirectory + BuyerRepository + ReservationRepository + 'static,
{
    Router::new()
        .route("/api/buyer/profile/:user_id", get(profile_handler::<S>))
        .with_state(state)
}

pub(crate) async fn profile_handler<S>(
    State(state): State<RouteState<BuyerProfileService<S>>>,
    Path(user_id): Path<String>,
    auth: Result<RequireAuth, ApiError>,
) -> Result<Json<BuyerDashboard>, ApiError>
where
    S: UserDirectory + BuyerRepository + ReservationRepository + 'static,
{
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::invalid_field("userId", "user id is required"));
    }

    let RequireAuth(principal) = auth?;
    let dashboard = state
        .service
        .dashboard(&principal, &UserId::new(user_id))?;
    Ok(Json(dashboard))
}

impl From<BuyerServiceError> for ApiError {
    fn from(value: BuyerServiceError) -> Self {
        match value {
            BuyerServiceError::Forbidden => ApiError::forbidden(),
            BuyerServiceError::ProfileNotFound => {
                ApiError::NotFound("buyer profile not found".to_string())
            }
            BuyerServiceError::Repository(error) => ApiError::from(error),
        }
    }
}
