//! Alert routes: creation by doctors, donor fan-out by blood banks, donor
//! responses, and the per-principal alert listings.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use domain::models::alert::{
    Alert, AlertResponse, AlertView, CreateAlertRequest, NotifyDonorsRequest,
    NotifyDonorsResponse, RespondToAlertRequest, ResponseDecision,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{BloodBankAuth, DoctorAuth, DonorAuth, Principal};
use crate::middleware::metrics::{record_alert_created, record_alert_fulfilled, record_donors_notified};
use crate::response::ApiResponse;

#[derive(Debug, Serialize)]
pub struct AlertBody {
    pub alert: Alert,
}

#[derive(Debug, Serialize)]
pub struct AlertListBody {
    pub alerts: Vec<AlertView>,
}

#[derive(Debug, Serialize)]
pub struct AlertResponsesBody {
    pub responses: Vec<AlertResponse>,
}

/// Create a pending alert against the doctor's hospital blood bank.
///
/// POST /api/alerts
pub async fn create_alert(
    State(state): State<AppState>,
    DoctorAuth(doctor): DoctorAuth,
    Json(request): Json<CreateAlertRequest>,
) -> Result<ApiResponse<AlertBody>, ApiError> {
    request.validate()?;

    let alert = state.alerts.create_alert(&doctor, request).await?;
    record_alert_created(alert.urgency.as_str());

    Ok(ApiResponse::created(AlertBody { alert }).with_message("Alert created successfully"))
}

/// Notify available donors of the alert's blood type near the bank.
///
/// POST /api/alerts/notify-donors
pub async fn notify_donors(
    State(state): State<AppState>,
    BloodBankAuth(bank): BloodBankAuth,
    Json(request): Json<NotifyDonorsRequest>,
) -> Result<ApiResponse<NotifyDonorsResponse>, ApiError> {
    request.validate()?;

    let notified_count = state
        .alerts
        .notify_donors(&bank, request.alert_id, request.radius)
        .await?;
    record_donors_notified(notified_count);

    Ok(ApiResponse::ok(NotifyDonorsResponse { notified_count })
        .with_message(format!("{} donors notified", notified_count)))
}

/// Accept (default) or decline an alert.
///
/// POST /api/alerts/:alert_id/respond
pub async fn respond_to_alert(
    State(state): State<AppState>,
    DonorAuth(donor): DonorAuth,
    Path(alert_id): Path<Uuid>,
    body: Bytes,
) -> Result<ApiResponse<AlertBody>, ApiError> {
    let request = parse_respond_body(&body)?;
    request.validate()?;

    let alert = state
        .alerts
        .respond_to_alert(&donor, alert_id, request.status, &request.message)
        .await?;

    let message = match request.status {
        ResponseDecision::Accepted => {
            record_alert_fulfilled();
            "Alert accepted successfully"
        }
        ResponseDecision::Declined => "Alert declined",
    };

    Ok(ApiResponse::ok(AlertBody { alert }).with_message(message))
}

/// An empty body means a plain acceptance.
fn parse_respond_body(body: &[u8]) -> Result<RespondToAlertRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RespondToAlertRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))
}

/// GET /api/alerts/bloodbank
pub async fn list_for_blood_bank(
    State(state): State<AppState>,
    BloodBankAuth(bank): BloodBankAuth,
) -> Result<ApiResponse<AlertListBody>, ApiError> {
    let alerts = state.alerts.list_for_blood_bank(&bank).await?;
    Ok(ApiResponse::ok(AlertListBody { alerts }))
}

/// GET /api/alerts/doctor
pub async fn list_for_doctor(
    State(state): State<AppState>,
    DoctorAuth(doctor): DoctorAuth,
) -> Result<ApiResponse<AlertListBody>, ApiError> {
    let alerts = state.alerts.list_for_doctor(&doctor).await?;
    Ok(ApiResponse::ok(AlertListBody { alerts }))
}

/// The response log of an alert, for its blood bank or its doctor.
///
/// GET /api/alerts/:alert_id/responses
pub async fn list_responses(
    State(state): State<AppState>,
    principal: Principal,
    Path(alert_id): Path<Uuid>,
) -> Result<ApiResponse<AlertResponsesBody>, ApiError> {
    let responses = state
        .alerts
        .list_responses(principal.caller(), alert_id)
        .await?;
    Ok(ApiResponse::ok(AlertResponsesBody { responses }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_respond_body_accepts() {
        let request = parse_respond_body(b"").unwrap();
        assert_eq!(request.status, ResponseDecision::Accepted);
        assert!(request.message.is_empty());
    }

    #[test]
    fn test_respond_body_decline() {
        let request =
            parse_respond_body(br#"{"status":"declined","message":"Out of town"}"#).unwrap();
        assert_eq!(request.status, ResponseDecision::Declined);
        assert_eq!(request.message, "Out of town");
    }

    #[test]
    fn test_respond_body_rejects_unknown_status() {
        let err = parse_respond_body(br#"{"status":"maybe"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
