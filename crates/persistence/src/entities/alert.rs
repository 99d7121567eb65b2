//! Alert and alert response entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::alert::{Alert, AlertResponse, PatientInfo};
use domain::models::BloodType;
use domain::DomainError;

use super::corrupt;

/// Database row mapping for the alerts table.
#[derive(Debug, Clone, FromRow)]
pub struct AlertEntity {
    pub id: Uuid,
    pub blood_type: String,
    pub quantity: i32,
    pub urgency: String,
    pub status: String,
    pub patient_name: Option<String>,
    pub patient_age: Option<i32>,
    pub patient_condition: Option<String>,
    pub doctor_id: Uuid,
    pub blood_bank_id: Uuid,
    pub accepted_donor_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AlertEntity> for Alert {
    type Error = DomainError;

    fn try_from(entity: AlertEntity) -> Result<Self, Self::Error> {
        let blood_type = entity
            .blood_type
            .parse::<BloodType>()
            .map_err(|e| corrupt("alerts", entity.id, &e.to_string()))?;

        Ok(Self {
            id: entity.id,
            blood_type,
            quantity: entity.quantity,
            urgency: entity.urgency.parse()?,
            status: entity.status.parse()?,
            patient_info: PatientInfo {
                name: entity.patient_name,
                age: entity.patient_age,
                condition: entity.patient_condition,
            },
            doctor_id: entity.doctor_id,
            blood_bank_id: entity.blood_bank_id,
            accepted_donor_id: entity.accepted_donor_id,
            expires_at: entity.expires_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

/// Database row mapping for the alert_responses table.
#[derive(Debug, Clone, FromRow)]
pub struct AlertResponseEntity {
    pub id: Uuid,
    pub alert_id: Uuid,
    pub donor_id: Uuid,
    pub status: String,
    pub message: String,
    pub responded_at: DateTime<Utc>,
}

impl TryFrom<AlertResponseEntity> for AlertResponse {
    type Error = DomainError;

    fn try_from(entity: AlertResponseEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            alert_id: entity.alert_id,
            donor_id: entity.donor_id,
            status: entity.status.parse()?,
            message: entity.message,
            responded_at: entity.responded_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::alert::{AlertStatus, Urgency};

    fn entity() -> AlertEntity {
        AlertEntity {
            id: Uuid::new_v4(),
            blood_type: "O-".to_string(),
            quantity: 2,
            urgency: "critical".to_string(),
            status: "pending".to_string(),
            patient_name: Some("J. Doe".to_string()),
            patient_age: Some(42),
            patient_condition: None,
            doctor_id: Uuid::new_v4(),
            blood_bank_id: Uuid::new_v4(),
            accepted_donor_id: None,
            expires_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_alert_row() {
        let alert = Alert::try_from(entity()).unwrap();
        assert_eq!(alert.blood_type, BloodType::ONegative);
        assert_eq!(alert.urgency, Urgency::Critical);
        assert_eq!(alert.status, AlertStatus::Pending);
        assert_eq!(alert.patient_info.age, Some(42));
    }

    #[test]
    fn test_bad_status_rejected() {
        let mut e = entity();
        e.status = "open".to_string();
        assert!(Alert::try_from(e).is_err());
    }
}
