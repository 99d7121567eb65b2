//! Blood bank inventory and the public nearby search.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use validator::Validate;

use domain::models::blood_bank::{
    InventoryResponse, NearbyBloodBank, NearbyBloodBanksQuery, UpdateInventoryRequest,
};
use domain::models::{BloodBank, GeoPoint};
use domain::services::geolocation::{find_within_radius, sort_by_distance, WithinRadius};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::BloodBankAuth;
use crate::response::ApiResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyBloodBanksBody {
    pub blood_banks: Vec<NearbyBloodBank>,
}

/// GET /api/bloodbanks/inventory
pub async fn get_inventory(BloodBankAuth(bank): BloodBankAuth) -> ApiResponse<InventoryResponse> {
    ApiResponse::ok(InventoryResponse::from(&bank))
}

/// Apply a signed delta to one blood type's unit count.
///
/// PATCH /api/bloodbanks/inventory
pub async fn update_inventory(
    State(state): State<AppState>,
    BloodBankAuth(bank): BloodBankAuth,
    Json(request): Json<UpdateInventoryRequest>,
) -> Result<ApiResponse<InventoryResponse>, ApiError> {
    request.validate()?;

    state
        .inventory
        .adjust(bank.id, request.blood_type, request.quantity)
        .await?;

    let bank = state
        .blood_banks
        .find_by_id(bank.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Blood bank not found".to_string()))?;

    Ok(ApiResponse::ok(InventoryResponse::from(&bank)).with_message("Inventory updated"))
}

/// Active blood banks around a point, nearest first. No authentication.
///
/// GET /api/bloodbanks/nearby
pub async fn nearby(
    State(state): State<AppState>,
    Query(query): Query<NearbyBloodBanksQuery>,
) -> Result<ApiResponse<NearbyBloodBanksBody>, ApiError> {
    query.validate()?;
    let center = GeoPoint::new(query.latitude, query.longitude)?;

    let alerts_config = &state.config.alerts;
    let radius_km = query
        .max_distance
        .unwrap_or(alerts_config.nearby_search_radius_km);
    if !(radius_km > 0.0 && radius_km <= alerts_config.max_search_radius_km) {
        return Err(ApiError::Validation(format!(
            "Max distance must be greater than 0 and at most {} km",
            alerts_config.max_search_radius_km
        )));
    }

    let banks = state.blood_banks.list_active().await?;
    let mut matches = find_within_radius(center, radius_km, banks, |_| true);
    sort_by_distance(&mut matches);

    let blood_banks = matches.into_iter().map(to_nearby).collect();
    Ok(ApiResponse::ok(NearbyBloodBanksBody { blood_banks }))
}

fn to_nearby(found: WithinRadius<BloodBank>) -> NearbyBloodBank {
    let bank = found.candidate;
    NearbyBloodBank {
        id: bank.id,
        hospital_name: bank.hospital_name,
        address: bank.address,
        phone: bank.phone,
        location: bank.location,
        distance_km: found.distance_km,
    }
}
