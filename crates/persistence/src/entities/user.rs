//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::user::{DoctorProfile, DonorProfile, DonorStatus, Role, User, UserProfile};
use domain::models::{BloodType, GeoPoint};
use domain::DomainError;

use super::corrupt;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role: String,
    pub blood_type: Option<String>,
    pub donor_status: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub medical_history: Option<String>,
    pub hospital: Option<String>,
    pub national_id: Option<String>,
    pub license_number: Option<String>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub fcm_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserEntity> for User {
    type Error = DomainError;

    fn try_from(entity: UserEntity) -> Result<Self, Self::Error> {
        let role: Role = entity.role.parse()?;

        let profile = match role {
            Role::Donor => {
                let blood_type = entity
                    .blood_type
                    .as_deref()
                    .ok_or_else(|| corrupt("users", entity.id, "donor without blood_type"))?
                    .parse::<BloodType>()
                    .map_err(|e| corrupt("users", entity.id, &e.to_string()))?;
                let status = entity
                    .donor_status
                    .as_deref()
                    .unwrap_or("available")
                    .parse::<DonorStatus>()?;
                UserProfile::Donor(DonorProfile {
                    blood_type,
                    status,
                    location: GeoPoint {
                        latitude: entity.latitude.unwrap_or(0.0),
                        longitude: entity.longitude.unwrap_or(0.0),
                    },
                    medical_history: entity.medical_history.unwrap_or_default(),
                })
            }
            Role::Doctor => UserProfile::Doctor(DoctorProfile {
                hospital: entity
                    .hospital
                    .ok_or_else(|| corrupt("users", entity.id, "doctor without hospital"))?,
                national_id: entity.national_id,
                license_number: entity.license_number,
            }),
        };

        Ok(Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            password_hash: entity.password_hash,
            phone: entity.phone,
            is_active: entity.is_active,
            last_login_at: entity.last_login_at,
            push_token: entity.fcm_token,
            profile,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}
