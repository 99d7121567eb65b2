//! Donor self-service: nearby alert search, location and availability.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use validator::Validate;

use domain::models::alert::{AlertView, NearbyAlertsQuery};
use domain::models::user::{UpdateDonorStatusRequest, UpdateLocationRequest, UserResponse};
use domain::models::GeoPoint;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::DonorAuth;
use crate::response::ApiResponse;

#[derive(Debug, Serialize)]
pub struct NearbyAlertsBody {
    pub alerts: Vec<AlertView>,
}

#[derive(Debug, Serialize)]
pub struct DonorBody {
    pub user: UserResponse,
}

/// Coordinates must be given together. Without them the donor's stored
/// location is used.
fn search_center(query: &NearbyAlertsQuery) -> Result<Option<GeoPoint>, ApiError> {
    match (query.latitude, query.longitude) {
        (Some(lat), Some(lon)) => Ok(Some(GeoPoint::new(lat, lon)?)),
        (None, None) => Ok(None),
        _ => Err(ApiError::Validation(
            "Latitude and longitude must be provided together".to_string(),
        )),
    }
}

/// Pending alerts at active blood banks near the donor, nearest first.
///
/// GET /api/donors/nearby-alerts
pub async fn nearby_alerts(
    State(state): State<AppState>,
    DonorAuth(donor): DonorAuth,
    Query(query): Query<NearbyAlertsQuery>,
) -> Result<ApiResponse<NearbyAlertsBody>, ApiError> {
    query.validate()?;
    let center = search_center(&query)?;

    let alerts = state
        .alerts
        .nearby_alerts(&donor, center, query.max_distance)
        .await?;

    Ok(ApiResponse::ok(NearbyAlertsBody { alerts }))
}

/// PATCH /api/donors/location
pub async fn update_location(
    State(state): State<AppState>,
    DonorAuth(donor): DonorAuth,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<ApiResponse<DonorBody>, ApiError> {
    request.validate()?;
    let location = GeoPoint::new(request.latitude, request.longitude)?;

    let user = state.users.update_location(donor.id, location).await?;
    tracing::debug!(user_id = %user.id, "Donor location updated");

    Ok(ApiResponse::ok(DonorBody { user: user.into() }).with_message("Location updated"))
}

/// PATCH /api/donors/status
pub async fn update_status(
    State(state): State<AppState>,
    DonorAuth(donor): DonorAuth,
    Json(request): Json<UpdateDonorStatusRequest>,
) -> Result<ApiResponse<DonorBody>, ApiError> {
    let user = state.users.update_status(donor.id, request.status).await?;
    tracing::info!(user_id = %user.id, status = request.status.as_str(), "Donor status updated");

    Ok(ApiResponse::ok(DonorBody { user: user.into() }).with_message("Status updated"))
}
