//! Blood alert domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::blood_type::BloodType;
use crate::error::DomainError;

/// How urgently blood is needed. Ordered `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        }
    }
}

impl FromStr for Urgency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            "critical" => Ok(Urgency::Critical),
            other => Err(DomainError::validation(format!("Unknown urgency: {}", other))),
        }
    }
}

/// Alert state machine.
///
/// `Pending` is the only non-terminal state. `Approved` is declared for
/// storage compatibility but no transition produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Pending,
    Approved,
    Rejected,
    Fulfilled,
    Cancelled,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Pending => "pending",
            AlertStatus::Approved => "approved",
            AlertStatus::Rejected => "rejected",
            AlertStatus::Fulfilled => "fulfilled",
            AlertStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AlertStatus::Rejected | AlertStatus::Fulfilled | AlertStatus::Cancelled
        )
    }
}

impl FromStr for AlertStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AlertStatus::Pending),
            "approved" => Ok(AlertStatus::Approved),
            "rejected" => Ok(AlertStatus::Rejected),
            "fulfilled" => Ok(AlertStatus::Fulfilled),
            "cancelled" => Ok(AlertStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "Unknown alert status: {}",
                other
            ))),
        }
    }
}

/// Free-form patient descriptor attached to an alert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    #[validate(length(max = 100, message = "Patient name must be at most 100 characters"))]
    pub name: Option<String>,

    #[validate(range(min = 0, max = 150, message = "Patient age must be between 0 and 150"))]
    pub age: Option<i32>,

    #[validate(length(max = 500, message = "Condition must be at most 500 characters"))]
    pub condition: Option<String>,
}

/// A request for blood raised by a doctor against a blood bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub blood_type: BloodType,
    pub quantity: i32,
    pub urgency: Urgency,
    pub status: AlertStatus,
    pub patient_info: PatientInfo,
    pub doctor_id: Uuid,
    pub blood_bank_id: Uuid,
    pub accepted_donor_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    pub fn is_pending(&self) -> bool {
        self.status == AlertStatus::Pending
    }

    /// Pending and not yet past its expiry. Expiry is advisory: it hides
    /// the alert from discovery but never changes its status.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && self.expires_at > now
    }
}

/// Data needed to insert an alert.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub blood_type: BloodType,
    pub quantity: i32,
    pub urgency: Urgency,
    pub patient_info: PatientInfo,
    pub doctor_id: Uuid,
    pub blood_bank_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Request payload for creating an alert.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    pub blood_type: BloodType,

    #[validate(range(min = 1, max = 1000, message = "Quantity must be between 1 and 1000"))]
    pub quantity: i32,

    #[serde(default)]
    pub urgency: Urgency,

    #[serde(default)]
    #[validate(nested)]
    pub patient_info: PatientInfo,
}

/// Status of one donor's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Pending,
    Accepted,
    Declined,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Pending => "pending",
            ResponseStatus::Accepted => "accepted",
            ResponseStatus::Declined => "declined",
        }
    }
}

impl FromStr for ResponseStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ResponseStatus::Pending),
            "accepted" => Ok(ResponseStatus::Accepted),
            "declined" => Ok(ResponseStatus::Declined),
            other => Err(DomainError::validation(format!(
                "Unknown response status: {}",
                other
            ))),
        }
    }
}

/// What a donor decides when responding to an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseDecision {
    #[default]
    Accepted,
    Declined,
}

impl From<ResponseDecision> for ResponseStatus {
    fn from(d: ResponseDecision) -> Self {
        match d {
            ResponseDecision::Accepted => ResponseStatus::Accepted,
            ResponseDecision::Declined => ResponseStatus::Declined,
        }
    }
}

/// One donor's reply to one alert. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub id: Uuid,
    pub alert_id: Uuid,
    pub donor_id: Uuid,
    pub status: ResponseStatus,
    pub message: String,
    pub responded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAlertResponse {
    pub alert_id: Uuid,
    pub donor_id: Uuid,
    pub status: ResponseStatus,
    pub message: String,
}

/// Request payload for `POST /api/alerts/:alertId/respond`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RespondToAlertRequest {
    #[serde(default)]
    pub status: ResponseDecision,

    #[serde(default)]
    #[validate(length(max = 200, message = "Message must be at most 200 characters"))]
    pub message: String,
}

/// Request payload for `POST /api/alerts/notify-donors`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotifyDonorsRequest {
    pub alert_id: Uuid,

    #[validate(range(
        exclusive_min = 0.0,
        max = 500.0,
        message = "Radius must be greater than 0 and at most 500 km"
    ))]
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyDonorsResponse {
    pub notified_count: usize,
}

/// Doctor display fields embedded in alert listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSummary {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub hospital: String,
}

/// Blood bank display fields embedded in alert listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodBankSummary {
    pub id: Uuid,
    pub hospital_name: String,
    pub address: String,
    pub phone: String,
}

/// Accepted donor display fields embedded in alert listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorSummary {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub blood_type: BloodType,
}

/// An alert with related display fields populated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertView {
    #[serde(flatten)]
    pub alert: Alert,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<DoctorSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_bank: Option<BloodBankSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_donor: Option<DonorSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl AlertView {
    pub fn bare(alert: Alert) -> Self {
        Self {
            alert,
            doctor: None,
            blood_bank: None,
            accepted_donor: None,
            distance_km: None,
        }
    }
}

/// Query parameters for `GET /api/donors/nearby-alerts`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NearbyAlertsQuery {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub longitude: Option<f64>,

    #[validate(range(
        exclusive_min = 0.0,
        max = 500.0,
        message = "Max distance must be greater than 0 and at most 500 km"
    ))]
    pub max_distance: Option<f64>,
}
